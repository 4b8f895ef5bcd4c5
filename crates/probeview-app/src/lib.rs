// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod collate;
pub mod extract;
pub mod model;
pub mod state;
pub mod view;

pub use collate::*;
pub use extract::*;
pub use model::*;
pub use state::*;
pub use view::*;
