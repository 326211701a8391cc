//! Project cost and timeline estimation.
//!
//! Pure arithmetic over a static pricing table: an archetype sets the
//! base costs, selected feature add-ons contribute additively, page or
//! user counts apply a stepped scale adjustment, and the timeline
//! preference scales the setup cost. Deterministic, no I/O.

use serde::{Deserialize, Serialize};

/// Work-week assumption for converting effort hours to weeks.
pub const HOURS_PER_WEEK: f64 = 40.0;

/// Setup cost band half-width (±15%).
pub const SETUP_BAND_SPREAD: f64 = 0.15;

/// Monthly cost band half-width (±10%).
pub const MONTHLY_BAND_SPREAD: f64 = 0.10;

/// Pages included in a page-scaled archetype's base price.
pub const INCLUDED_PAGES: u32 = 10;

/// Setup cost per page beyond the included count.
pub const PER_EXTRA_PAGE_SETUP: f64 = 100.0;

/// Effort hours per page beyond the included count.
pub const PER_EXTRA_PAGE_HOURS: f64 = 2.0;

/// Users included in a user-scaled archetype's base price.
pub const INCLUDED_USERS: u32 = 100;

/// Size of one billing block of users.
pub const USER_BLOCK_SIZE: u32 = 100;

/// Monthly cost per user block once the included count is exceeded.
pub const PER_USER_BLOCK_MONTHLY: f64 = 50.0;

// ============================================================================
// Pricing table
// ============================================================================

/// Which input drives an archetype's scale adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleDimension {
    Pages,
    Users,
}

impl ScaleDimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScaleDimension::Pages => "pages",
            ScaleDimension::Users => "users",
        }
    }
}

/// Closed set of project categories the agency quotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectArchetype {
    Website,
    WebTool,
    WebApplication,
    SaasPlatform,
}

struct ArchetypeProfile {
    base_setup: f64,
    base_monthly: f64,
    base_hours: f64,
    /// Descriptive only; not part of the estimate arithmetic
    complexity: f64,
    scale: ScaleDimension,
}

impl ProjectArchetype {
    pub const ALL: [ProjectArchetype; 4] = [
        ProjectArchetype::Website,
        ProjectArchetype::WebTool,
        ProjectArchetype::WebApplication,
        ProjectArchetype::SaasPlatform,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectArchetype::Website => "website",
            ProjectArchetype::WebTool => "web_tool",
            ProjectArchetype::WebApplication => "web_application",
            ProjectArchetype::SaasPlatform => "saas_platform",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "website" => Some(ProjectArchetype::Website),
            "web_tool" => Some(ProjectArchetype::WebTool),
            "web_application" => Some(ProjectArchetype::WebApplication),
            "saas_platform" => Some(ProjectArchetype::SaasPlatform),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProjectArchetype::Website => "Website",
            ProjectArchetype::WebTool => "Web Tool",
            ProjectArchetype::WebApplication => "Web Application",
            ProjectArchetype::SaasPlatform => "SaaS Platform",
        }
    }

    fn profile(&self) -> ArchetypeProfile {
        match self {
            ProjectArchetype::Website => ArchetypeProfile {
                base_setup: 2200.0,
                base_monthly: 120.0,
                base_hours: 40.0,
                complexity: 1.0,
                scale: ScaleDimension::Pages,
            },
            ProjectArchetype::WebTool => ArchetypeProfile {
                base_setup: 4500.0,
                base_monthly: 180.0,
                base_hours: 80.0,
                complexity: 1.3,
                scale: ScaleDimension::Users,
            },
            ProjectArchetype::WebApplication => ArchetypeProfile {
                base_setup: 8000.0,
                base_monthly: 250.0,
                base_hours: 140.0,
                complexity: 1.6,
                scale: ScaleDimension::Users,
            },
            ProjectArchetype::SaasPlatform => ArchetypeProfile {
                base_setup: 15000.0,
                base_monthly: 400.0,
                base_hours: 240.0,
                complexity: 2.0,
                scale: ScaleDimension::Users,
            },
        }
    }
}

/// Closed set of optional feature add-ons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureAddon {
    UserAccounts,
    Payments,
    Cms,
    Booking,
    Ecommerce,
    SiteSearch,
    Analytics,
    Multilingual,
    ApiIntegration,
    EmailNotifications,
}

struct FeatureDeltas {
    setup: f64,
    monthly: f64,
    hours: f64,
}

impl FeatureAddon {
    pub const ALL: [FeatureAddon; 10] = [
        FeatureAddon::UserAccounts,
        FeatureAddon::Payments,
        FeatureAddon::Cms,
        FeatureAddon::Booking,
        FeatureAddon::Ecommerce,
        FeatureAddon::SiteSearch,
        FeatureAddon::Analytics,
        FeatureAddon::Multilingual,
        FeatureAddon::ApiIntegration,
        FeatureAddon::EmailNotifications,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureAddon::UserAccounts => "user_accounts",
            FeatureAddon::Payments => "payments",
            FeatureAddon::Cms => "cms",
            FeatureAddon::Booking => "booking",
            FeatureAddon::Ecommerce => "ecommerce",
            FeatureAddon::SiteSearch => "site_search",
            FeatureAddon::Analytics => "analytics",
            FeatureAddon::Multilingual => "multilingual",
            FeatureAddon::ApiIntegration => "api_integration",
            FeatureAddon::EmailNotifications => "email_notifications",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "user_accounts" => Some(FeatureAddon::UserAccounts),
            "payments" => Some(FeatureAddon::Payments),
            "cms" => Some(FeatureAddon::Cms),
            "booking" => Some(FeatureAddon::Booking),
            "ecommerce" => Some(FeatureAddon::Ecommerce),
            "site_search" => Some(FeatureAddon::SiteSearch),
            "analytics" => Some(FeatureAddon::Analytics),
            "multilingual" => Some(FeatureAddon::Multilingual),
            "api_integration" => Some(FeatureAddon::ApiIntegration),
            "email_notifications" => Some(FeatureAddon::EmailNotifications),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FeatureAddon::UserAccounts => "User accounts",
            FeatureAddon::Payments => "Payment processing",
            FeatureAddon::Cms => "Content management",
            FeatureAddon::Booking => "Booking & scheduling",
            FeatureAddon::Ecommerce => "E-commerce",
            FeatureAddon::SiteSearch => "Site search",
            FeatureAddon::Analytics => "Analytics dashboard",
            FeatureAddon::Multilingual => "Multilingual content",
            FeatureAddon::ApiIntegration => "Third-party API integration",
            FeatureAddon::EmailNotifications => "Email notifications",
        }
    }

    fn deltas(&self) -> FeatureDeltas {
        match self {
            FeatureAddon::UserAccounts => FeatureDeltas { setup: 800.0, monthly: 20.0, hours: 16.0 },
            FeatureAddon::Payments => FeatureDeltas { setup: 1200.0, monthly: 40.0, hours: 24.0 },
            FeatureAddon::Cms => FeatureDeltas { setup: 900.0, monthly: 25.0, hours: 18.0 },
            FeatureAddon::Booking => FeatureDeltas { setup: 1100.0, monthly: 30.0, hours: 20.0 },
            FeatureAddon::Ecommerce => FeatureDeltas { setup: 2500.0, monthly: 60.0, hours: 48.0 },
            FeatureAddon::SiteSearch => FeatureDeltas { setup: 700.0, monthly: 15.0, hours: 12.0 },
            FeatureAddon::Analytics => FeatureDeltas { setup: 500.0, monthly: 15.0, hours: 8.0 },
            FeatureAddon::Multilingual => FeatureDeltas { setup: 1000.0, monthly: 20.0, hours: 20.0 },
            FeatureAddon::ApiIntegration => FeatureDeltas { setup: 1500.0, monthly: 35.0, hours: 30.0 },
            FeatureAddon::EmailNotifications => FeatureDeltas { setup: 600.0, monthly: 20.0, hours: 12.0 },
        }
    }
}

/// Delivery timeline preference. Scales setup cost only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimelinePreference {
    Urgent,
    #[default]
    Normal,
    Flexible,
}

impl TimelinePreference {
    pub const ALL: [TimelinePreference; 3] = [
        TimelinePreference::Urgent,
        TimelinePreference::Normal,
        TimelinePreference::Flexible,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimelinePreference::Urgent => "urgent",
            TimelinePreference::Normal => "normal",
            TimelinePreference::Flexible => "flexible",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "urgent" => Some(TimelinePreference::Urgent),
            "normal" => Some(TimelinePreference::Normal),
            "flexible" => Some(TimelinePreference::Flexible),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimelinePreference::Urgent => "Urgent",
            TimelinePreference::Normal => "Normal",
            TimelinePreference::Flexible => "Flexible",
        }
    }

    pub fn setup_multiplier(&self) -> f64 {
        match self {
            TimelinePreference::Urgent => 1.5,
            TimelinePreference::Normal => 1.0,
            TimelinePreference::Flexible => 0.9,
        }
    }
}

// ============================================================================
// Estimation
// ============================================================================

/// A validated estimate request.
#[derive(Debug, Clone)]
pub struct EstimateInput {
    pub archetype: ProjectArchetype,
    pub features: Vec<FeatureAddon>,
    pub timeline: TimelinePreference,
    pub page_count: Option<u32>,
    pub user_count: Option<u32>,
}

/// Price bands and timeline produced by [`estimate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Estimate {
    pub setup_min: i64,
    pub setup_max: i64,
    pub monthly_min: i64,
    pub monthly_max: i64,
    pub estimated_weeks: i64,
    pub effort_hours: i64,
}

/// Compute a price and timeline estimate.
///
/// Feature costs are purely additive with no interaction terms, and
/// duplicate selections count once. Banding rounds half away from
/// zero.
pub fn estimate(input: &EstimateInput) -> Estimate {
    let profile = input.archetype.profile();

    let mut setup = profile.base_setup;
    let mut monthly = profile.base_monthly;
    let mut hours = profile.base_hours;

    // Walking the full table in declaration order collapses duplicates
    for feature in FeatureAddon::ALL {
        if input.features.contains(&feature) {
            let deltas = feature.deltas();
            setup += deltas.setup;
            monthly += deltas.monthly;
            hours += deltas.hours;
        }
    }

    match profile.scale {
        ScaleDimension::Pages => {
            if let Some(pages) = input.page_count {
                if pages > INCLUDED_PAGES {
                    let extra = f64::from(pages - INCLUDED_PAGES);
                    setup += extra * PER_EXTRA_PAGE_SETUP;
                    hours += extra * PER_EXTRA_PAGE_HOURS;
                }
            }
        }
        ScaleDimension::Users => {
            if let Some(users) = input.user_count {
                if users > INCLUDED_USERS {
                    // Blocks cover the total user count, not just the overflow
                    let blocks = (f64::from(users) / f64::from(USER_BLOCK_SIZE)).ceil();
                    monthly += blocks * PER_USER_BLOCK_MONTHLY;
                }
            }
        }
    }

    setup *= input.timeline.setup_multiplier();

    Estimate {
        setup_min: (setup * (1.0 - SETUP_BAND_SPREAD)).round() as i64,
        setup_max: (setup * (1.0 + SETUP_BAND_SPREAD)).round() as i64,
        monthly_min: (monthly * (1.0 - MONTHLY_BAND_SPREAD)).round() as i64,
        monthly_max: (monthly * (1.0 + MONTHLY_BAND_SPREAD)).round() as i64,
        estimated_weeks: (hours / HOURS_PER_WEEK).ceil() as i64,
        effort_hours: hours.round() as i64,
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// One archetype entry in the public pricing catalog.
#[derive(Debug, Clone, Serialize)]
pub struct ArchetypeInfo {
    pub key: &'static str,
    pub label: &'static str,
    pub base_setup: f64,
    pub base_monthly: f64,
    pub base_hours: f64,
    pub complexity: f64,
    pub scales_by: &'static str,
}

/// One feature entry in the public pricing catalog.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureInfo {
    pub key: &'static str,
    pub label: &'static str,
    pub setup: f64,
    pub monthly: f64,
    pub hours: f64,
}

/// One timeline entry in the public pricing catalog.
#[derive(Debug, Clone, Serialize)]
pub struct TimelineInfo {
    pub key: &'static str,
    pub label: &'static str,
    pub setup_multiplier: f64,
}

/// The full pricing table, as served to estimate forms.
#[derive(Debug, Clone, Serialize)]
pub struct EstimatorCatalog {
    pub archetypes: Vec<ArchetypeInfo>,
    pub features: Vec<FeatureInfo>,
    pub timelines: Vec<TimelineInfo>,
}

/// The pricing table behind [`estimate`].
pub fn catalog() -> EstimatorCatalog {
    EstimatorCatalog {
        archetypes: ProjectArchetype::ALL
            .iter()
            .map(|archetype| {
                let profile = archetype.profile();
                ArchetypeInfo {
                    key: archetype.as_str(),
                    label: archetype.label(),
                    base_setup: profile.base_setup,
                    base_monthly: profile.base_monthly,
                    base_hours: profile.base_hours,
                    complexity: profile.complexity,
                    scales_by: profile.scale.as_str(),
                }
            })
            .collect(),
        features: FeatureAddon::ALL
            .iter()
            .map(|feature| {
                let deltas = feature.deltas();
                FeatureInfo {
                    key: feature.as_str(),
                    label: feature.label(),
                    setup: deltas.setup,
                    monthly: deltas.monthly,
                    hours: deltas.hours,
                }
            })
            .collect(),
        timelines: TimelinePreference::ALL
            .iter()
            .map(|timeline| TimelineInfo {
                key: timeline.as_str(),
                label: timeline.label(),
                setup_multiplier: timeline.setup_multiplier(),
            })
            .collect(),
    }
}
