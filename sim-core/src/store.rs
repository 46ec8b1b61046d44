//! Fixed-capacity columnar particle storage.
//!
//! Each attribute lives in its own `Vec<f32>` of length `len`, so a pass
//! over one attribute touches contiguous memory and a particle never owns
//! an allocation of its own. Rows are materialized on demand as
//! [`Particle`] values.

use std::str::FromStr;

use glam::Vec2;

use crate::{
    error::{Result, SimError},
    types::ParticleId,
};

/// One column of the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Attribute {
    X,
    Y,
    Vx,
    Vy,
    /// Current alpha in `[0, 255]`.
    Alpha,
    /// Frames alive.
    Age,
    /// Frames until forced recycle.
    Ttl,
    /// Noise coupling coefficient.
    Coupling,
    R,
    G,
    B,
}

impl Attribute {
    pub const COUNT: usize = 11;

    /// Columns in row order.
    pub const ALL: [Attribute; Self::COUNT] = [
        Attribute::X,
        Attribute::Y,
        Attribute::Vx,
        Attribute::Vy,
        Attribute::Alpha,
        Attribute::Age,
        Attribute::Ttl,
        Attribute::Coupling,
        Attribute::R,
        Attribute::G,
        Attribute::B,
    ];

    /// Position of this column inside a row.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Short column name, as used by [`FromStr`].
    pub const fn name(self) -> &'static str {
        match self {
            Attribute::X => "x",
            Attribute::Y => "y",
            Attribute::Vx => "vx",
            Attribute::Vy => "vy",
            Attribute::Alpha => "a",
            Attribute::Age => "l",
            Attribute::Ttl => "ttl",
            Attribute::Coupling => "vc",
            Attribute::R => "r",
            Attribute::G => "g",
            Attribute::B => "b",
        }
    }
}

impl FromStr for Attribute {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        Attribute::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or_else(|| SimError::UnknownAttribute(s.to_owned()))
    }
}

/// A materialized row of the store.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub alpha: f32,
    pub age: f32,
    pub ttl: f32,
    pub coupling: f32,
    pub color: [f32; 3],
}

impl Particle {
    /// Flattens the particle into row order (see [`Attribute::ALL`]).
    pub fn to_row(&self) -> [f32; Attribute::COUNT] {
        [
            self.pos.x,
            self.pos.y,
            self.vel.x,
            self.vel.y,
            self.alpha,
            self.age,
            self.ttl,
            self.coupling,
            self.color[0],
            self.color[1],
            self.color[2],
        ]
    }

    pub fn from_row(row: &[f32; Attribute::COUNT]) -> Self {
        Self {
            pos: Vec2::new(row[0], row[1]),
            vel: Vec2::new(row[2], row[3]),
            alpha: row[4],
            age: row[5],
            ttl: row[6],
            coupling: row[7],
            color: [row[8], row[9], row[10]],
        }
    }

    /// A particle is live while it is younger than its ttl.
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.age >= self.ttl
    }
}

/// Structure-of-arrays store holding `len` particles.
///
/// Index bounds are the caller's responsibility: accessors index the
/// columns directly and panic on an out-of-range [`ParticleId`].
#[derive(Clone, Debug)]
pub struct ParticleStore {
    columns: [Vec<f32>; Attribute::COUNT],
    len: usize,
}

impl ParticleStore {
    /// Allocates a zero-filled store with room for exactly `len` particles.
    pub fn with_len(len: usize) -> Self {
        Self {
            columns: std::array::from_fn(|_| vec![0.0; len]),
            len,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn get(&self, id: ParticleId, attr: Attribute) -> f32 {
        self.columns[attr.index()][id]
    }

    #[inline]
    pub fn set(&mut self, id: ParticleId, attr: Attribute, value: f32) {
        self.columns[attr.index()][id] = value;
    }

    /// Reads a column by its short name (`"x"`, `"ttl"`, ...).
    pub fn get_named(&self, id: ParticleId, name: &str) -> Result<f32> {
        Ok(self.get(id, name.parse()?))
    }

    /// Writes a column by its short name.
    pub fn set_named(&mut self, id: ParticleId, name: &str, value: f32) -> Result<()> {
        self.set(id, name.parse()?, value);
        Ok(())
    }

    /// Returns all attributes of a particle in row order.
    pub fn row(&self, id: ParticleId) -> [f32; Attribute::COUNT] {
        std::array::from_fn(|c| self.columns[c][id])
    }

    /// Overwrites the first `min(values.len(), Attribute::COUNT)` columns of a row.
    ///
    /// Columns past the end of `values` keep their previous contents, so a
    /// prefix such as `[x, y, vx, vy, a, l]` updates motion state only.
    pub fn set_row(&mut self, id: ParticleId, values: &[f32]) {
        for (column, &v) in self.columns.iter_mut().zip(values) {
            column[id] = v;
        }
    }

    #[inline]
    pub fn particle(&self, id: ParticleId) -> Particle {
        Particle::from_row(&self.row(id))
    }

    /// Fully overwrites a slot.
    #[inline]
    pub fn put(&mut self, id: ParticleId, p: &Particle) {
        self.set_row(id, &p.to_row());
    }

    /// Read-only view of one column.
    pub fn column(&self, attr: Attribute) -> &[f32] {
        &self.columns[attr.index()]
    }

    /// Visits every particle in index order.
    pub fn for_each(&self, mut visit: impl FnMut(Particle, ParticleId)) {
        for id in 0..self.len {
            visit(self.particle(id), id);
        }
    }

    /// Visits every particle in index order and collects the results.
    pub fn map<T>(&self, mut f: impl FnMut(Particle, ParticleId) -> T) -> Vec<T> {
        let mut out = Vec::with_capacity(self.len);
        self.for_each(|p, id| out.push(f(p, id)));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    #[test]
    fn with_len_is_zeroed() {
        let store = ParticleStore::with_len(4);
        assert_eq!(store.len(), 4);
        for id in 0..4 {
            assert_eq!(store.row(id), [0.0; Attribute::COUNT]);
        }
    }

    #[test]
    fn set_row_then_row_round_trips() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut store = ParticleStore::with_len(64);

        for _ in 0..200 {
            let id = rng.random_range(0..store.len());
            let values: [f32; Attribute::COUNT] =
                std::array::from_fn(|_| rng.random_range(-1000.0..1000.0));
            store.set_row(id, &values);
            assert_eq!(store.row(id), values);
        }
    }

    #[test]
    fn short_row_only_touches_prefix() {
        let mut store = ParticleStore::with_len(2);
        store.set_row(1, &[9.0; Attribute::COUNT]);

        store.set_row(1, &[1.0, 2.0, 3.0]);

        let row = store.row(1);
        assert_eq!(&row[..3], &[1.0, 2.0, 3.0]);
        assert!(row[3..].iter().all(|&v| v == 9.0));
        // Neighbouring slot untouched.
        assert_eq!(store.row(0), [0.0; Attribute::COUNT]);
    }

    #[test]
    fn long_row_is_truncated() {
        let mut store = ParticleStore::with_len(1);
        let values: Vec<f32> = (0..20).map(|v| v as f32).collect();
        store.set_row(0, &values);
        assert_eq!(store.row(0).to_vec(), values[..Attribute::COUNT].to_vec());
    }

    #[test]
    fn named_access_matches_typed_access() {
        let mut store = ParticleStore::with_len(3);
        store.set_named(2, "ttl", 123.0).unwrap();
        assert_eq!(store.get(2, Attribute::Ttl), 123.0);
        assert_eq!(store.get_named(2, "ttl").unwrap(), 123.0);
    }

    #[test]
    fn unknown_attribute_is_an_error() {
        let mut store = ParticleStore::with_len(1);
        assert!(matches!(
            store.get_named(0, "mass"),
            Err(SimError::UnknownAttribute(name)) if name == "mass"
        ));
        assert!(store.set_named(0, "zz", 1.0).is_err());
    }

    #[test]
    fn particle_row_conversion_is_lossless() {
        let p = Particle {
            pos: Vec2::new(1.0, 2.0),
            vel: Vec2::new(-0.5, 0.25),
            alpha: 200.0,
            age: 5.0,
            ttl: 150.0,
            coupling: 3.5,
            color: [10.0, 20.0, 30.0],
        };
        let mut store = ParticleStore::with_len(1);
        store.put(0, &p);
        assert_eq!(store.particle(0), p);
        assert_eq!(store.get(0, Attribute::Coupling), 3.5);
    }

    #[test]
    fn for_each_and_map_visit_in_index_order() {
        let mut store = ParticleStore::with_len(5);
        for id in 0..5 {
            store.set(id, Attribute::X, id as f32 * 10.0);
        }

        let mut seen = Vec::new();
        store.for_each(|_, id| seen.push(id));
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);

        let xs = store.map(|p, _| p.pos.x);
        assert_eq!(xs, vec![0.0, 10.0, 20.0, 30.0, 40.0]);
        assert_eq!(store.column(Attribute::X), xs.as_slice());
    }
}
