pub mod impl_fake;
pub mod impl_xcap;
pub mod interface;
