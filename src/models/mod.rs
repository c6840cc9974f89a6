pub mod movie;
pub mod showtime;
pub mod seat;
pub mod extra;
pub mod sale;

pub use movie::Movie;
pub use showtime::Showtime;
pub use seat::Seat;
pub use extra::Extra;
pub use sale::Sale;
