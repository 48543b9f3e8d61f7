// handlers/mod.rs - Handlers grouped by security tier
//
// Public (no auth) → Protected (authenticated principal required)

pub mod protected; // Tier 2: /api/* except /api/auth/*
pub mod public; // Tier 1: /, /health, /api/auth/*
