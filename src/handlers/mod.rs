// Handlers are split by access tier:
// Public (no auth, /auth/* and health) → Protected (session token required, /api/*)
pub mod protected;
pub mod public;
