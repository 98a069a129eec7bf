//! Fixed-capacity particle store with ring allocation.
//!
//! Slots below `floor` hold the static seed set of the current level and are
//! never recycled; `[floor, capacity)` is a ring that new effect particles
//! overwrite oldest-first. Every write is recorded as a dirty range so the
//! driver uploads exactly what changed.

use bevy::prelude::*;
use std::num::NonZeroUsize;
use std::ops::Range;

use crate::error::PoolError;
use crate::particle::Particle;

/// Physical slots written by one `insert_many`, in logical order.
///
/// `tail` is empty unless the batch wrapped back to the floor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InsertSpan {
    pub head: Range<usize>,
    pub tail: Range<usize>,
}

impl InsertSpan {
    /// assigned ids, oldest first
    pub fn ids(&self) -> impl Iterator<Item = usize> {
        self.head.clone().chain(self.tail.clone())
    }

    pub fn len(&self) -> usize {
        self.head.len() + self.tail.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Resource, Debug)]
pub struct ParticlePool {
    particles: Vec<Particle>,
    floor: usize,
    cursor: usize,
    dirty: Vec<Range<usize>>,
}

impl ParticlePool {
    /// All slots start empty and are queued for upload.
    pub fn new(capacity: NonZeroUsize) -> Self {
        let capacity = capacity.get();
        Self {
            particles: vec![Particle::EMPTY; capacity],
            floor: 0,
            cursor: 0,
            dirty: vec![0..capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.particles.len()
    }

    pub fn floor(&self) -> usize {
        self.floor
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// slots available to recycled insertions
    pub fn recyclable(&self) -> usize {
        self.capacity() - self.floor
    }

    pub fn as_slice(&self) -> &[Particle] {
        &self.particles
    }

    pub fn live_count(&self) -> usize {
        self.particles.iter().filter(|p| p.is_live()).count()
    }

    /// Forget every particle and unlock the floor. Queues a full upload.
    pub fn clear(&mut self) {
        self.particles.fill(Particle::EMPTY);
        self.floor = 0;
        self.cursor = self.floor;
        self.dirty.clear();
        self.dirty.push(0..self.capacity());
    }

    /// Write one particle at the cursor and return its id. Never fails; on
    /// wraparound the oldest recyclable particle is overwritten.
    pub fn insert_one(&mut self, mut particle: Particle) -> i32 {
        let slot = self.cursor;
        particle.id = slot as i32;
        self.particles[slot] = particle;
        self.mark_dirty(slot..slot + 1);

        self.cursor += 1;
        if self.cursor >= self.capacity() {
            self.cursor = self.floor;
        }
        particle.id
    }

    /// Write a contiguous batch starting at the cursor, assigning ids in place.
    ///
    /// Ids that would reach the capacity wrap to `floor + overflow`, so the
    /// write splits into at most two physical ranges. A batch larger than the
    /// recyclable region is rejected before anything is touched.
    pub fn insert_many(&mut self, batch: &mut [Particle]) -> Result<InsertSpan, PoolError> {
        let capacity = self.capacity();
        let count = batch.len();
        if count > self.recyclable() {
            return Err(PoolError::BatchTooLarge {
                count,
                available: self.recyclable(),
            });
        }

        let end = self.cursor + count;
        let overflow = end.saturating_sub(capacity);
        let span = InsertSpan {
            head: self.cursor..end.min(capacity),
            tail: self.floor..self.floor + overflow,
        };

        for (particle, id) in batch.iter_mut().zip(span.ids()) {
            particle.id = id as i32;
        }

        let (head, tail) = batch.split_at(span.head.len());
        self.particles[span.head.clone()].copy_from_slice(head);
        self.particles[span.tail.clone()].copy_from_slice(tail);
        self.mark_dirty(span.head.clone());
        self.mark_dirty(span.tail.clone());

        self.cursor = if end >= capacity {
            self.floor + overflow
        } else {
            end
        };
        Ok(span)
    }

    /// Protect everything written so far. Called once per level load, after
    /// the static set is in.
    pub fn lock_floor(&mut self) {
        self.floor = self.cursor;
    }

    /// ranges written since the last flush, merged where contiguous
    pub fn dirty(&self) -> &[Range<usize>] {
        &self.dirty
    }

    /// Hand every dirty range to `upload`, oldest first. A range is only
    /// forgotten once its upload succeeded, so a failed flush resumes later.
    pub fn flush<E>(
        &mut self,
        mut upload: impl FnMut(usize, &[Particle]) -> Result<(), E>,
    ) -> Result<(), E> {
        let mut done = 0;
        let result = self.dirty.iter().try_for_each(|range| {
            upload(range.start, &self.particles[range.clone()])?;
            done += 1;
            Ok(())
        });
        self.dirty.drain(..done);
        result
    }

    fn mark_dirty(&mut self, range: Range<usize>) {
        if range.is_empty() {
            return;
        }
        if let Some(last) = self.dirty.last_mut() {
            if last.start <= range.start && range.end <= last.end {
                return;
            }
            if last.end == range.start {
                last.end = range.end;
                return;
            }
        }
        self.dirty.push(range);
    }
}
