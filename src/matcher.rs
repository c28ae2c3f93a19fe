use thiserror::Error;

use crate::edition::Edition;
use crate::release::Asset;

#[derive(Error, Debug)]
#[error("unsupported native package for {edition} ({file_name})")]
pub struct MatchError {
    pub edition: String,
    pub file_name: String,
}

/// Find the asset carrying `edition`'s expected archive. The first URL ending
/// with `<identifier>-lib.tar.gz` wins.
pub fn match_asset<'a>(edition: &Edition, assets: &'a [Asset]) -> Result<&'a Asset, MatchError> {
    let file_name = edition.expected_asset_name();
    assets
        .iter()
        .find(|a| a.url.ends_with(&file_name))
        .ok_or_else(|| MatchError {
            edition: edition.name().to_owned(),
            file_name,
        })
}
