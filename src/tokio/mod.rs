// Copyright (c) 2023 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-async-zip/blob/main/LICENSE)

//! A tokio-specific implementation which wraps types presented by the base implementation.

pub mod read;
