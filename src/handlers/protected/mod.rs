// handlers/protected/mod.rs - Handlers behind `require_auth`
//
// Every route here sits under /api and is reached only with an
// authenticated principal in the request extensions.

pub mod clients;
pub mod companies;
pub mod contracts;
pub mod persons;
