//! Route handlers. Each one decodes the request, calls exactly one service
//! operation and encodes the result.

pub mod forums;
pub mod posts;
pub mod service;
pub mod threads;
pub mod users;
