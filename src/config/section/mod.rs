//! Configuration section definitions.
//!
//! Each module corresponds to a section in `speedway.toml`:
//!
//! | Module       | TOML Section                  | Purpose                       |
//! |--------------|-------------------------------|-------------------------------|
//! | `features`   | `[features]`                  | Optimization switches         |
//! | `origin`     | `[site]`                      | Origin, document root, fonts  |
//! | `delivery`   | `[cdn]` `[minify]` `[cache]`  | Asset delivery options        |
//! | `media`      | `[image]`                     | Encoder qualities             |
//! | `preference` | `[theme]`                     | Theme store and nonce secret  |
//! | `serve`      | `[serve]`                     | Host server                   |

mod delivery;
mod features;
mod media;
mod origin;
mod preference;
mod serve;

pub use delivery::{CacheConfig, CdnConfig, MinifyConfig, MinifyEngine};
pub use features::FeaturesConfig;
pub use media::ImageConfig;
pub use origin::SiteConfig;
pub use preference::ThemeConfig;
pub use serve::ServeConfig;
