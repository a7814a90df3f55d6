// Copyright 2024 TsumiNa.
// SPDX-License-Identifier: Apache-2.0

use std::{error, fmt};

#[derive(Debug, Clone)]
pub struct CrystalGeneratorError(pub String);

impl fmt::Display for CrystalGeneratorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::result::Result<(), std::fmt::Error> {
        write!(f, "CrystalGeneratorError -- `{}`", self.0)
    }
}

impl error::Error for CrystalGeneratorError {}
