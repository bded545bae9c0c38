//! End-to-end tests live in `tests/`; they drive the services and the router
//! over the in-memory store.
