pub mod assembler;
mod command;
mod provider;
mod record;
mod subscription;
mod tag;

pub use assembler::{AssembledRecipe, Assembler, Collaborators, RatingInfo};
pub use command::{Command, CreateInput, RecipeResponse, UpdateInput};
pub use provider::{FilterInput, Provider, ProviderConfig};
pub use record::RecipeRecord;
pub use subscription::RecipeSubscriber;
pub use tag::{Tag, Tags};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;
