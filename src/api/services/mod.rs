pub mod analytics;
pub mod health;
pub mod helpers;
pub mod interstitial;
pub mod leads;
pub mod links;
pub mod redirect;

pub use analytics::analytics_routes;
pub use health::{AppStartTime, HealthService, health_routes};
pub use interstitial::{InterstitialService, interstitial_routes};
pub use leads::lead_routes;
pub use links::link_routes;
pub use redirect::{RedirectService, redirect_routes};
