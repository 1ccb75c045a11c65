//! Picture-scoped authorization: token minting and the route guard.

pub mod guard;
pub mod token;

pub use guard::{picture_guard, PictureAccess};
pub use token::{PictureClaims, PictureTokenService};
