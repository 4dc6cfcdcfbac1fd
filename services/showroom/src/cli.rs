//! services/showroom/src/cli.rs
//!
//! Command line surface of the showroom. Each subcommand maps to one `Showroom`
//! operation and produces a JSON value for the binary to print.

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{json, Value};
use showroom_core::domain::{NewUser, ThemePreference, User, UserUpdate};
use showroom_core::ports::CatalogSource;
use tracing::debug;
use uuid::Uuid;

use crate::app::{CarFilter, Showroom};
use crate::error::AppError;

#[derive(Debug, Parser)]
#[command(name = "showroom")]
#[command(about = "Browse the car catalog and manage local showroom data")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Command {
    /// List every car in the catalog
    Catalog,
    /// Search cars by brand or model
    Search { term: String },
    /// Filter the catalog
    Filter {
        #[arg(value_enum)]
        kind: FilterKind,
        value: String,
    },
    /// Open a car, recording the view
    View { car_id: String },
    /// Show the view history, most recent first
    History {
        /// Sort by view count instead
        #[arg(long)]
        most_viewed: bool,
    },
    /// Remove one car from the view history
    Forget { car_id: String },
    /// Clear the view history
    ClearHistory,
    /// Compare two cars side by side
    Compare { left: String, right: String },
    /// Record that a car was shared
    Share { car_id: String },
    /// Photos of a car, served from the local cache when fresh
    Images {
        car_id: String,
        /// Ignore the cache and search again
        #[arg(long)]
        refresh: bool,
    },
    /// Drop every cached image
    ClearCache,
    /// Usage statistics, level and achievements
    Stats,
    /// Reset usage statistics
    ResetStats,
    /// Show or change the theme
    Theme {
        #[arg(value_enum)]
        choice: Option<ThemeChoice>,
    },
    /// Show or change notification settings
    Notifications {
        #[arg(long)]
        enabled: Option<bool>,
        #[arg(long)]
        new_arrivals: Option<bool>,
        #[arg(long)]
        price_alerts: Option<bool>,
        #[arg(long)]
        reminder_hour: Option<u8>,
    },
    /// Create an account and sign in
    Register {
        name: String,
        email: String,
        password: String,
        #[arg(long)]
        phone: Option<String>,
    },
    Login { email: String, password: String },
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Update the signed-in user's profile
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },
    /// Review a car as the signed-in user
    Review {
        car_id: String,
        rating: u8,
        #[arg(required = true, num_args = 1..)]
        comment: Vec<String>,
    },
    /// Edit one of your reviews
    EditReview {
        review_id: Uuid,
        rating: u8,
        #[arg(required = true, num_args = 1..)]
        comment: Vec<String>,
    },
    DeleteReview { review_id: Uuid },
    /// Reviews and rating summary for a car
    Reviews { car_id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FilterKind {
    Brand,
    Fuel,
    Drivetrain,
    MaxPrice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ThemeChoice {
    Light,
    Dark,
    System,
    Toggle,
}

impl FilterKind {
    fn into_filter(self, value: &str) -> Result<CarFilter, AppError> {
        Ok(match self {
            FilterKind::Brand => CarFilter::Brand(value.to_string()),
            FilterKind::Fuel => CarFilter::FuelType(value.to_string()),
            FilterKind::Drivetrain => CarFilter::Drivetrain(value.to_string()),
            FilterKind::MaxPrice => CarFilter::MaxPrice(value.parse().map_err(|_| {
                AppError::Usage(format!("max-price expects a whole number, got '{}'", value))
            })?),
        })
    }
}

/// The public view of a user; the password hash never leaves the store.
fn user_json(user: &User) -> Value {
    json!({
        "id": user.id,
        "name": user.name,
        "email": user.email,
        "phone": user.phone,
        "dateBirth": user.date_birth,
        "createdAt": user.created_at,
    })
}

async fn set_theme(showroom: &Showroom, theme: ThemePreference) -> Result<ThemePreference, AppError> {
    showroom.theme.set(theme).await?;
    Ok(theme)
}

/// Runs one command against the showroom.
pub async fn run(showroom: &Showroom, command: Command) -> Result<Value, AppError> {
    debug!(?command, "Running command");
    let output = match command {
        Command::Catalog => serde_json::to_value(showroom.catalog.cars())?,
        Command::Search { term } => serde_json::to_value(showroom.search_catalog(&term).await)?,
        Command::Filter { kind, value } => {
            let filter = kind.into_filter(&value)?;
            serde_json::to_value(showroom.apply_filter(&filter).await)?
        }
        Command::View { car_id } => serde_json::to_value(showroom.view_car(&car_id).await?)?,
        Command::History { most_viewed } => {
            let items = if most_viewed {
                showroom.history.most_viewed().await
            } else {
                showroom.history.entries().await
            };
            serde_json::to_value(items)?
        }
        Command::Forget { car_id } => {
            showroom.history.remove_from_history(&car_id).await?;
            json!({ "removed": car_id })
        }
        Command::ClearHistory => {
            showroom.history.clear_history().await?;
            json!({ "cleared": "history" })
        }
        Command::Compare { left, right } => {
            let comparison = showroom.compare_cars(&left, &right).await?;
            let (left_wins, right_wins) = comparison.score();
            json!({
                "comparison": comparison,
                "score": { "left": left_wins, "right": right_wins },
            })
        }
        Command::Share { car_id } => {
            showroom.share_car(&car_id).await?;
            json!({ "shared": car_id })
        }
        Command::Images { car_id, refresh } => {
            serde_json::to_value(showroom.car_images(&car_id, refresh).await?)?
        }
        Command::ClearCache => {
            showroom.images.clear_cache().await?;
            json!({ "cleared": "images" })
        }
        Command::Stats => serde_json::to_value(showroom.stats.report().await)?,
        Command::ResetStats => {
            showroom.stats.reset().await?;
            json!({ "cleared": "stats" })
        }
        Command::Theme { choice } => {
            let theme = match choice {
                None => showroom.theme.current().await,
                Some(ThemeChoice::Toggle) => showroom.theme.toggle().await?,
                Some(ThemeChoice::Light) => set_theme(showroom, ThemePreference::Light).await?,
                Some(ThemeChoice::Dark) => set_theme(showroom, ThemePreference::Dark).await?,
                Some(ThemeChoice::System) => set_theme(showroom, ThemePreference::System).await?,
            };
            json!({ "theme": theme })
        }
        Command::Notifications {
            enabled,
            new_arrivals,
            price_alerts,
            reminder_hour,
        } => {
            let settings = showroom
                .notifications
                .update(|settings| {
                    if let Some(enabled) = enabled {
                        settings.enabled = enabled;
                    }
                    if let Some(new_arrivals) = new_arrivals {
                        settings.new_arrivals = new_arrivals;
                    }
                    if let Some(price_alerts) = price_alerts {
                        settings.price_alerts = price_alerts;
                    }
                    if let Some(hour) = reminder_hour {
                        settings.reminder_hour = hour;
                    }
                })
                .await?;
            serde_json::to_value(settings)?
        }
        Command::Register {
            name,
            email,
            password,
            phone,
        } => {
            let success = showroom
                .auth
                .register(NewUser {
                    name,
                    email,
                    password,
                    phone,
                    ..Default::default()
                })
                .await?;
            json!({ "message": success.message, "user": user_json(&success.user) })
        }
        Command::Login { email, password } => {
            let success = showroom.auth.login(&email, &password).await?;
            json!({ "message": success.message, "user": user_json(&success.user) })
        }
        Command::Logout => {
            showroom.auth.logout().await?;
            json!({ "signedIn": false })
        }
        Command::Whoami => match showroom.auth.current_user().await {
            Some(user) => user_json(&user),
            None => json!({ "signedIn": false }),
        },
        Command::Profile {
            name,
            email,
            phone,
            password,
        } => {
            let user = showroom
                .auth
                .update_user(UserUpdate {
                    name,
                    email,
                    phone,
                    password,
                    ..Default::default()
                })
                .await?;
            user_json(&user)
        }
        Command::Review {
            car_id,
            rating,
            comment,
        } => serde_json::to_value(
            showroom
                .submit_review(&car_id, rating, &comment.join(" "))
                .await?,
        )?,
        Command::EditReview {
            review_id,
            rating,
            comment,
        } => serde_json::to_value(
            showroom
                .edit_review(review_id, rating, &comment.join(" "))
                .await?,
        )?,
        Command::DeleteReview { review_id } => {
            showroom.ratings.delete_review(review_id).await?;
            json!({ "deleted": review_id })
        }
        Command::Reviews { car_id } => {
            let car = showroom.car(&car_id)?;
            json!({
                "car": car.display_name(),
                "average": showroom.ratings.average_rating(&car_id).await,
                "count": showroom.ratings.review_count(&car_id).await,
                "distribution": showroom.ratings.rating_distribution(&car_id).await,
                "reviews": showroom.ratings.reviews_for_car(&car_id).await,
                "mine": showroom.ratings.user_review(&car_id).await,
            })
        }
    };
    Ok(output)
}
