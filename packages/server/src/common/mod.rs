// Cross-cutting types shared by domains and the server layer

pub mod auth;
