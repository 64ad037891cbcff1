pub mod city;
pub mod series;
pub mod temperature_unit;
