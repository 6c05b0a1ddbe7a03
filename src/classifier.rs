pub mod impl_fake;
pub mod impl_tract;
pub mod interface;
pub mod preprocess;
pub mod ranking;
