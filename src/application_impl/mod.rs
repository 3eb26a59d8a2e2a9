mod follow_command_impl;
mod follow_resolver_impl;
mod identity_trusted_header;
mod pair_guard;

pub use follow_command_impl::*;
pub use follow_resolver_impl::*;
pub use identity_trusted_header::*;
pub use pair_guard::*;
