pub mod config_cmd;
pub mod contract;
pub mod dispatch;
pub mod doctor;
pub mod gateway;
pub mod onboard;
pub mod policy;
pub mod providers;
pub mod remote;
pub mod usage;
