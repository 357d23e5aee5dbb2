// SPDX-License-Identifier: BSD-3-Clause

/// Rejections while lowering a parsed module into the analysis view.
/// Anything the analyses merely ignore (constant operands, indirect
/// callees) is not an error.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("duplicate definition of function @{0}")]
    DuplicateFunction(String),
}
