/// Router Module Index
///
/// Organizes the application's routing logic into security-segregated modules.
/// Access control is applied explicitly at the module level (via Axum layers),
/// so a route's placement alone decides which tier of checks it passes through.
///
/// The three modules map directly to the defined access tiers.

/// Routes accessible to any client, session or not: health, account gateway.
pub mod public;

/// Read-only catalog routes protected by the session-verification middleware.
/// Requires a valid session cookie.
pub mod authenticated;

/// Mutation routes restricted exclusively to admin accounts.
pub mod admin;
