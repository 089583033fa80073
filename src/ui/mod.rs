pub mod info;
pub mod panels;
pub mod plot;
pub mod table;
