mod polar;

pub use polar::*;
