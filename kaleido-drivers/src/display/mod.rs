//! Panel drivers

pub mod ili9341;
