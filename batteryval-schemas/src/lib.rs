pub mod assay;
pub mod feedstock;
pub mod file_formats;
pub mod market;
pub mod metal;
pub mod packaging;
pub mod process;
pub mod route;
pub mod transport;
