pub mod chart;
pub mod station;
pub mod variable;
