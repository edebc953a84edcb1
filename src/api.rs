pub mod inverter;
pub mod octopus;
