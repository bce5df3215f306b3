//! Pattern resolution
//!
//! [`Resolver::resolve`] turns a [`ConnectivityPattern`] and the two
//! endpoint layouts into a lazy [`LinkIter`]. Structured patterns are
//! enumerated from the layout sizes; explicit patterns are refreshed from
//! their generator first and every link is range-checked against the
//! current layouts. Out-of-range links are skipped and counted.

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::connectivity::generator::{ExplicitConnections, GeneratorKind};
use crate::connectivity::ConnectivityPattern;
use crate::error::{Diagnostics, Result, SpikeVizError};
use crate::model::EntityId;
use crate::types::Link;

/// Consulted before a stale explicit list is regenerated on the UI path.
///
/// Called with no lock held, so it may block on the user.
#[cfg_attr(test, mockall::automock)]
pub trait RegenerationGate {
    fn confirm(&self, connection: EntityId, kind: GeneratorKind) -> bool;
}

/// Gate that always allows regeneration
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysRegenerate;

impl RegenerationGate for AlwaysRegenerate {
    fn confirm(&self, _connection: EntityId, _kind: GeneratorKind) -> bool {
        true
    }
}

/// Outcome of bringing an explicit list up to date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    /// The list was already current
    Current,
    /// The list was regenerated, new version attached
    Regenerated(u64),
}

/// Resolves patterns, regenerating explicit lists through a gate
pub struct Resolver<'g> {
    gate: &'g dyn RegenerationGate,
}

impl Default for Resolver<'static> {
    fn default() -> Self {
        Self {
            gate: &AlwaysRegenerate,
        }
    }
}

impl<'g> Resolver<'g> {
    pub fn new(gate: &'g dyn RegenerationGate) -> Self {
        Self { gate }
    }

    /// Bring an explicit list up to date.
    ///
    /// The changed flag is read under the lock, the gate is asked with the
    /// lock released, and the regeneration itself runs under the lock. A
    /// concurrent regeneration that finished in between turns this into a
    /// no-op.
    pub fn refresh_explicit(
        &self,
        connection: EntityId,
        explicit: &ExplicitConnections,
        src_layout: &[Vec3],
        dst_layout: &[Vec3],
    ) -> Result<Refresh> {
        let kind = {
            let guard = explicit.lock();
            if !guard.is_stale() {
                return Ok(Refresh::Current);
            }
            guard.kind()
        };

        if !self.gate.confirm(connection, kind) {
            tracing::info!("Regeneration of {} declined", connection);
            return Err(SpikeVizError::GenerationDeclined(connection));
        }

        let mut guard = explicit.lock();
        if guard.regenerate_if_stale(src_layout, dst_layout)? {
            tracing::debug!(
                "Regenerated {} {} links for {}",
                guard.links().len(),
                kind,
                connection
            );
            Ok(Refresh::Regenerated(guard.version()))
        } else {
            Ok(Refresh::Current)
        }
    }

    /// Resolve `pattern` against the given layouts.
    ///
    /// Fails only for pattern-level problems (one-to-one size mismatch,
    /// invalid probability, declined or failed regeneration). Per-link
    /// range problems are skipped by the iterator and counted.
    pub fn resolve(
        &self,
        connection: EntityId,
        pattern: &ConnectivityPattern,
        src_layout: &[Vec3],
        dst_layout: &[Vec3],
    ) -> Result<LinkIter> {
        let src_len = src_layout.len();
        let dst_len = dst_layout.len();
        match pattern {
            ConnectivityPattern::OneToOne => one_to_one(src_len, dst_len),
            ConnectivityPattern::AllToAll => Ok(LinkIter::all_to_all(src_len, dst_len)),
            ConnectivityPattern::FixedProbability { probability, seed } => {
                fixed_probability(*probability, *seed, src_len, dst_len)
            }
            ConnectivityPattern::Explicit(explicit) => {
                self.refresh_explicit(connection, explicit, src_layout, dst_layout)?;
                let (links, _) = explicit.snapshot();
                Ok(LinkIter::explicit(links, src_len, dst_len))
            }
        }
    }

    /// Resolve and collect, recording problems instead of returning them.
    ///
    /// A pattern-level failure yields an empty list.
    pub fn collect(
        &self,
        connection: EntityId,
        pattern: &ConnectivityPattern,
        src_layout: &[Vec3],
        dst_layout: &[Vec3],
        diagnostics: &mut Diagnostics,
    ) -> Vec<Link> {
        match self.resolve(connection, pattern, src_layout, dst_layout) {
            Ok(mut iter) => {
                let links: Vec<Link> = iter.by_ref().collect();
                let skipped = iter.skipped();
                if let Some(first) = iter.first_skipped.take() {
                    diagnostics.add_skipped_links(skipped);
                    let err = first.with_context(format!("{} links out of range were skipped", skipped));
                    diagnostics.push_error(Some(connection), &err);
                }
                links
            }
            Err(e) => {
                diagnostics.push_error(Some(connection), &e);
                Vec::new()
            }
        }
    }
}

fn one_to_one(src_len: usize, dst_len: usize) -> Result<LinkIter> {
    if src_len != dst_len {
        return Err(SpikeVizError::PatternMismatch(format!(
            "one-to-one needs equal population sizes, got {} and {}",
            src_len, dst_len
        )));
    }
    Ok(LinkIter {
        inner: Inner::OneToOne {
            next: 0,
            len: src_len,
        },
        skipped: 0,
        first_skipped: None,
    })
}

fn fixed_probability(probability: f64, seed: u64, src_len: usize, dst_len: usize) -> Result<LinkIter> {
    if !(0.0..=1.0).contains(&probability) {
        return Err(SpikeVizError::PatternMismatch(format!(
            "connection probability {} outside [0, 1]",
            probability
        )));
    }
    Ok(LinkIter {
        inner: Inner::FixedProbability {
            rng: StdRng::seed_from_u64(seed),
            probability,
            src_len,
            dst_len,
            i: 0,
            j: 0,
        },
        skipped: 0,
        first_skipped: None,
    })
}

/// Lazily produced links of one resolved pattern
#[derive(Debug)]
pub struct LinkIter {
    inner: Inner,
    skipped: usize,
    first_skipped: Option<SpikeVizError>,
}

#[derive(Debug)]
enum Inner {
    OneToOne {
        next: usize,
        len: usize,
    },
    AllToAll {
        src_len: usize,
        dst_len: usize,
        i: usize,
        j: usize,
    },
    FixedProbability {
        rng: StdRng,
        probability: f64,
        src_len: usize,
        dst_len: usize,
        i: usize,
        j: usize,
    },
    Explicit {
        links: std::vec::IntoIter<Link>,
        src_len: usize,
        dst_len: usize,
    },
}

impl LinkIter {
    fn all_to_all(src_len: usize, dst_len: usize) -> Self {
        Self {
            inner: Inner::AllToAll {
                src_len,
                dst_len,
                i: 0,
                j: 0,
            },
            skipped: 0,
            first_skipped: None,
        }
    }

    fn explicit(links: Vec<Link>, src_len: usize, dst_len: usize) -> Self {
        Self {
            inner: Inner::Explicit {
                links: links.into_iter(),
                src_len,
                dst_len,
            },
            skipped: 0,
            first_skipped: None,
        }
    }

    /// Links dropped so far because an index was out of range
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// The first link dropped so far, as an error
    pub fn first_skipped(&self) -> Option<&SpikeVizError> {
        self.first_skipped.as_ref()
    }
}

impl Iterator for LinkIter {
    type Item = Link;

    fn next(&mut self) -> Option<Link> {
        match &mut self.inner {
            Inner::OneToOne { next, len } => {
                if *next >= *len {
                    return None;
                }
                let i = *next as u32;
                *next += 1;
                Some(Link::new(i, i))
            }
            Inner::AllToAll {
                src_len,
                dst_len,
                i,
                j,
            } => {
                if *dst_len == 0 || *i >= *src_len {
                    return None;
                }
                let link = Link::new(*i as u32, *j as u32);
                *j += 1;
                if *j >= *dst_len {
                    *j = 0;
                    *i += 1;
                }
                Some(link)
            }
            Inner::FixedProbability {
                rng,
                probability,
                src_len,
                dst_len,
                i,
                j,
            } => {
                // one draw per (i, j) pair in row-major order
                while *dst_len > 0 && *i < *src_len {
                    let link = Link::new(*i as u32, *j as u32);
                    *j += 1;
                    if *j >= *dst_len {
                        *j = 0;
                        *i += 1;
                    }
                    if rng.random::<f64>() < *probability {
                        return Some(link);
                    }
                }
                None
            }
            Inner::Explicit {
                links,
                src_len,
                dst_len,
            } => {
                for link in links.by_ref() {
                    if link.in_range(*src_len, *dst_len) {
                        return Some(link);
                    }
                    self.skipped += 1;
                    if self.first_skipped.is_none() {
                        self.first_skipped = Some(SpikeVizError::LinkOutOfRange {
                            src: link.src,
                            dst: link.dst,
                            src_len: *src_len,
                            dst_len: *dst_len,
                        });
                    }
                    tracing::trace!(
                        "Skipping link {} -> {} (layouts {} / {})",
                        link.src,
                        link.dst,
                        src_len,
                        dst_len
                    );
                }
                None
            }
        }
    }
}
