// ABOUTME: Artifact reference parsing and validation.
// ABOUTME: An artifact is registry/repository:tag; all three parts are required.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseArtifactRefError {
    #[error("artifact reference cannot be empty")]
    Empty,

    #[error("invalid character in artifact reference: {0}")]
    InvalidChar(char),

    #[error("artifact reference has no registry component: {0}")]
    MissingRegistry(String),

    #[error("artifact reference has no tag: {0}")]
    MissingTag(String),

    #[error("artifact repository cannot be empty")]
    EmptyRepository,

    #[error("artifact tag exceeds maximum length of 128 characters")]
    TagTooLong,
}

/// An immutable pointer to one deployable image: registry, repository, tag.
///
/// Unlike loose Docker references there are no defaults here. The tag must
/// be explicit so that two rollouts of the same reference always mean the
/// same bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ArtifactRef {
    registry: String,
    repository: String,
    tag: String,
}

impl ArtifactRef {
    /// Build a reference from its three components, validating each.
    ///
    /// # Errors
    ///
    /// Returns `ParseArtifactRefError` if any component is empty or contains
    /// characters outside the image-reference charset.
    pub fn new(
        registry: &str,
        repository: &str,
        tag: &str,
    ) -> Result<Self, ParseArtifactRefError> {
        if registry.is_empty() {
            return Err(ParseArtifactRefError::MissingRegistry(String::new()));
        }
        if repository.is_empty() {
            return Err(ParseArtifactRefError::EmptyRepository);
        }
        if tag.is_empty() {
            return Err(ParseArtifactRefError::MissingTag(format!(
                "{}/{}",
                registry, repository
            )));
        }
        if tag.len() > 128 {
            return Err(ParseArtifactRefError::TagTooLong);
        }

        for c in registry.chars() {
            if !c.is_ascii_alphanumeric() && c != '.' && c != '-' && c != ':' {
                return Err(ParseArtifactRefError::InvalidChar(c));
            }
        }
        for c in repository.chars() {
            if !c.is_ascii_lowercase() && !c.is_ascii_digit() && c != '/' && c != '.' && c != '-'
                && c != '_'
            {
                return Err(ParseArtifactRefError::InvalidChar(c));
            }
        }
        for c in tag.chars() {
            if !c.is_ascii_alphanumeric() && c != '.' && c != '-' && c != '_' {
                return Err(ParseArtifactRefError::InvalidChar(c));
            }
        }

        Ok(Self {
            registry: registry.to_string(),
            repository: repository.to_string(),
            tag: tag.to_string(),
        })
    }

    /// Parse the canonical string form `registry/repository:tag`.
    ///
    /// # Errors
    ///
    /// Returns `ParseArtifactRefError` when the input is empty, lacks a
    /// registry or tag, or contains invalid characters.
    pub fn parse(input: &str) -> Result<Self, ParseArtifactRefError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ParseArtifactRefError::Empty);
        }

        // Split off the tag. A colon inside a registry port looks the same,
        // so only treat it as a tag separator when the suffix has no slash.
        let (without_tag, tag) = match input.rsplit_once(':') {
            Some((before, after)) if !after.contains('/') => (before, after),
            _ => return Err(ParseArtifactRefError::MissingTag(input.to_string())),
        };

        // The first path component is the registry. Require it to look like
        // a host (dot, port, or localhost) so bare Docker Hub shorthand is
        // rejected rather than silently resolved.
        let (registry, repository) = match without_tag.split_once('/') {
            Some((first, rest))
                if first.contains('.') || first.contains(':') || first == "localhost" =>
            {
                (first, rest)
            }
            _ => return Err(ParseArtifactRefError::MissingRegistry(input.to_string())),
        };

        Self::new(registry, repository, tag)
    }

    pub fn registry(&self) -> &str {
        &self.registry
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}:{}", self.registry, self.repository, self.tag)
    }
}
