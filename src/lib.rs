pub mod axis;
pub mod controller;
pub mod protocol;
pub mod socket_server;
