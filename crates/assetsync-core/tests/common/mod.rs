#![allow(dead_code)]

pub mod blob_server;
