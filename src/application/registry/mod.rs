//! Registries
//!
//! - creators: 后端名称 -> App 工厂
//! - controllers: 有序控制器集合
//! - services: 按名称解析的外部协作者

mod controllers;
mod creators;
mod services;

pub use controllers::{Controller, Controllers};
pub use creators::{AppCreator, AppCreators};
pub use services::{NamedRegistry, Services, DEFAULT_NAME};
