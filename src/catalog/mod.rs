pub mod builder;
pub mod city_catalog;
pub mod error;
mod io;
