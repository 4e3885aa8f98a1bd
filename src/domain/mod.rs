// 資料模型與各層之間的 trait

pub mod model;
pub mod ports;
