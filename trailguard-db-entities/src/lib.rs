#![allow(non_snake_case)]

pub mod AddressBan;
pub mod LocationSample;
pub mod RejectedRequest;
