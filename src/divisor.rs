// Copyright 2025 Lars Brubaker
// License: MIT
//
// Invariant Weil divisors on a C*-surface.
//
// A divisor is a rational coefficient vector over the rays of a surface:
// one block-indexed part for the rays (i, j) and one optional scalar per
// apex ray. The surface is only consulted for shape and intersection
// numbers; divisors never modify it.

use std::ops::{Add, Mul, Neg, Sub};

use num_rational::Rational64;
use num_traits::{One, Zero};

use crate::block::BlockVec;
use crate::error::{Error, Result};
use crate::surface::{CStarSurface, RayRef, Sign};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct InvariantDivisor {
    coefficients: BlockVec<Rational64>,
    plus: Option<Rational64>,
    minus: Option<Rational64>,
}

impl InvariantDivisor {
    pub fn zero(surface: &CStarSurface) -> Self {
        let apex = |sign| surface.has_parabolic_curve(sign).then(Rational64::zero);
        InvariantDivisor {
            coefficients: BlockVec::filled_like(surface.l(), Rational64::zero()),
            plus: apex(Sign::Plus),
            minus: apex(Sign::Minus),
        }
    }

    /// The prime divisor of a single ray.
    pub fn prime(surface: &CStarSurface, ray: RayRef) -> Result<Self> {
        let mut divisor = Self::zero(surface);
        *divisor.slot_mut(ray)? = Rational64::one();
        Ok(divisor)
    }

    /// Divisor with the given coefficients, checked against the shape of
    /// `surface`.
    pub fn from_parts(
        surface: &CStarSurface,
        coefficients: BlockVec<Rational64>,
        plus: Option<Rational64>,
        minus: Option<Rational64>,
    ) -> Result<Self> {
        let divisor = InvariantDivisor {
            coefficients,
            plus,
            minus,
        };
        if divisor.fits(surface) {
            Ok(divisor)
        } else {
            Err(Error::ShapeMismatch)
        }
    }

    /// Divisor from coefficients listed in ray-index order.
    pub fn from_flat(surface: &CStarSurface, values: &[Rational64]) -> Result<Self> {
        if values.len() != surface.ray_count() {
            return Err(Error::ShapeMismatch);
        }
        let mut divisor = Self::zero(surface);
        for (index, &value) in values.iter().enumerate() {
            let ray = surface.ray_ref(index).ok_or(Error::ShapeMismatch)?;
            *divisor.slot_mut(ray)? = value;
        }
        Ok(divisor)
    }

    /// True iff the divisor has exactly the rays of `surface`.
    pub fn fits(&self, surface: &CStarSurface) -> bool {
        self.coefficients.same_shape(surface.l())
            && self.plus.is_some() == surface.has_parabolic_curve(Sign::Plus)
            && self.minus.is_some() == surface.has_parabolic_curve(Sign::Minus)
    }

    pub fn coefficients(&self) -> &BlockVec<Rational64> {
        &self.coefficients
    }

    pub fn apex_coefficient(&self, sign: Sign) -> Option<Rational64> {
        match sign {
            Sign::Plus => self.plus,
            Sign::Minus => self.minus,
        }
    }

    pub fn coefficient(&self, ray: RayRef) -> Option<Rational64> {
        match ray {
            RayRef::Block { block, index } => self.coefficients.get(block, index).copied(),
            RayRef::Apex(sign) => self.apex_coefficient(sign),
        }
    }

    fn slot_mut(&mut self, ray: RayRef) -> Result<&mut Rational64> {
        match ray {
            RayRef::Block { block, index } => self
                .coefficients
                .get_mut(block, index)
                .ok_or(Error::IndexOutOfRange { block, index }),
            RayRef::Apex(Sign::Plus) => self.plus.as_mut().ok_or(Error::NoParabolicCurve(Sign::Plus)),
            RayRef::Apex(Sign::Minus) => self
                .minus
                .as_mut()
                .ok_or(Error::NoParabolicCurve(Sign::Minus)),
        }
    }

    /// Coefficients in ray-index order.
    pub fn to_flat(&self) -> Vec<Rational64> {
        self.coefficients
            .values()
            .copied()
            .chain(self.plus)
            .chain(self.minus)
            .collect()
    }

    /// `Some(ray)` iff this is exactly the prime divisor of `ray`.
    pub fn as_prime(&self) -> Option<RayRef> {
        let mut found = None;
        let entries = self
            .coefficients
            .iter()
            .map(|((block, index), &c)| (RayRef::Block { block, index }, c))
            .chain(self.plus.map(|c| (RayRef::Apex(Sign::Plus), c)))
            .chain(self.minus.map(|c| (RayRef::Apex(Sign::Minus), c)));
        for (ray, c) in entries {
            if c.is_zero() {
                continue;
            }
            if !c.is_one() || found.is_some() {
                return None;
            }
            found = Some(ray);
        }
        found
    }

    pub fn is_prime(&self) -> bool {
        self.as_prime().is_some()
    }

    /// The same divisor after `ray` has been removed from the fan: its
    /// coefficient is dropped and later entries of its block move down by
    /// one. Apex removal drops the apex slot.
    pub fn delete_ray(&self, ray: RayRef) -> Result<Self> {
        let mut out = self.clone();
        match ray {
            RayRef::Block { block, index } => {
                out.coefficients
                    .remove(block, index)
                    .ok_or(Error::IndexOutOfRange { block, index })?;
            }
            RayRef::Apex(Sign::Plus) => {
                out.plus.take().ok_or(Error::NoParabolicCurve(Sign::Plus))?;
            }
            RayRef::Apex(Sign::Minus) => {
                out.minus.take().ok_or(Error::NoParabolicCurve(Sign::Minus))?;
            }
        }
        Ok(out)
    }

    pub fn intersection(&self, other: &InvariantDivisor, surface: &CStarSurface) -> Result<Rational64> {
        if !self.fits(surface) || !other.fits(surface) {
            return Err(Error::ShapeMismatch);
        }
        Ok(bilinear(&self.to_flat(), &other.to_flat(), surface.intersection_matrix()))
    }

    pub fn self_intersection(&self, surface: &CStarSurface) -> Result<Rational64> {
        self.intersection(self, surface)
    }

    pub fn checked_add(&self, other: &InvariantDivisor) -> Result<Self> {
        self.combine(other, |a, b| a + b)
    }

    pub fn checked_sub(&self, other: &InvariantDivisor) -> Result<Self> {
        self.combine(other, |a, b| a - b)
    }

    fn combine<F>(&self, other: &InvariantDivisor, f: F) -> Result<Self>
    where
        F: Fn(Rational64, Rational64) -> Rational64,
    {
        let apex = |a: Option<Rational64>, b: Option<Rational64>| match (a, b) {
            (Some(a), Some(b)) => Ok(Some(f(a, b))),
            (None, None) => Ok(None),
            _ => Err(Error::ShapeMismatch),
        };
        Ok(InvariantDivisor {
            coefficients: self
                .coefficients
                .zip_with(&other.coefficients, |&a, &b| f(a, b))
                .ok_or(Error::ShapeMismatch)?,
            plus: apex(self.plus, other.plus)?,
            minus: apex(self.minus, other.minus)?,
        })
    }

    pub fn scale(&self, factor: Rational64) -> Self {
        InvariantDivisor {
            coefficients: self.coefficients.map(|&c| c * factor),
            plus: self.plus.map(|c| c * factor),
            minus: self.minus.map(|c| c * factor),
        }
    }
}

/// # Panics
/// When the two divisors live on surfaces with different ray sets; use
/// [`InvariantDivisor::checked_add`] to get an error instead.
impl Add for &InvariantDivisor {
    type Output = InvariantDivisor;

    fn add(self, other: Self) -> InvariantDivisor {
        match self.checked_add(other) {
            Ok(sum) => sum,
            Err(_) => panic!("adding divisors of differently shaped surfaces"),
        }
    }
}

/// # Panics
/// When the two divisors live on surfaces with different ray sets.
impl Sub for &InvariantDivisor {
    type Output = InvariantDivisor;

    fn sub(self, other: Self) -> InvariantDivisor {
        match self.checked_sub(other) {
            Ok(diff) => diff,
            Err(_) => panic!("subtracting divisors of differently shaped surfaces"),
        }
    }
}

impl Neg for &InvariantDivisor {
    type Output = InvariantDivisor;

    fn neg(self) -> InvariantDivisor {
        self.scale(-Rational64::one())
    }
}

impl<'a> Mul<&'a InvariantDivisor> for Rational64 {
    type Output = InvariantDivisor;

    fn mul(self, divisor: &'a InvariantDivisor) -> InvariantDivisor {
        divisor.scale(self)
    }
}

impl CStarSurface {
    /// The canonical divisor `K = -Σ D_ρ + (r - 1)·Σ_j l_0j D_0j`.
    pub fn canonical_divisor(&self) -> InvariantDivisor {
        let r_minus_one = Rational64::from(self.r() as i64 - 1);
        let coefficients = self.l().map(|_| -Rational64::one());
        let mut coefficients = coefficients.into_blocks();
        for (c, &l) in coefficients[0].iter_mut().zip(self.l().block(0)) {
            *c += r_minus_one * Rational64::from(l);
        }
        let apex = |sign| self.has_parabolic_curve(sign).then(|| -Rational64::one());
        InvariantDivisor {
            coefficients: BlockVec::new(coefficients),
            plus: apex(Sign::Plus),
            minus: apex(Sign::Minus),
        }
    }

    pub fn anticanonical_divisor(&self) -> InvariantDivisor {
        -&self.canonical_divisor()
    }

    /// Anticanonical self-intersection `K²`.
    pub fn degree(&self) -> Rational64 {
        let k = self.canonical_divisor().to_flat();
        bilinear(&k, &k, self.intersection_matrix())
    }
}

/// `aᵀ M b` over flat coefficient vectors in ray-index order.
fn bilinear(a: &[Rational64], b: &[Rational64], matrix: &[Vec<Rational64>]) -> Rational64 {
    let mut total = Rational64::zero();
    for (i, ai) in a.iter().enumerate().filter(|(_, c)| !c.is_zero()) {
        for (j, bj) in b.iter().enumerate().filter(|(_, c)| !c.is_zero()) {
            total += ai * bj * matrix[i][j];
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::Case;

    fn e6() -> CStarSurface {
        CStarSurface::new(
            vec![vec![3, 1], vec![3], vec![2]],
            vec![vec![-2, -1], vec![1], vec![1]],
            Case::Ee,
        )
        .unwrap()
    }

    fn pp() -> CStarSurface {
        CStarSurface::new(vec![vec![1, 1], vec![1]], vec![vec![1, 0], vec![0]], Case::Pp).unwrap()
    }

    #[test]
    fn prime_divisors_are_recognized() {
        let x = pp();
        let ray = RayRef::Block { block: 0, index: 1 };
        let d = InvariantDivisor::prime(&x, ray).unwrap();
        assert_eq!(d.as_prime(), Some(ray));
        let apex = InvariantDivisor::prime(&x, RayRef::Apex(Sign::Minus)).unwrap();
        assert_eq!(apex.as_prime(), Some(RayRef::Apex(Sign::Minus)));
        assert!(!InvariantDivisor::zero(&x).is_prime());
        assert!(!(&d + &apex).is_prime());
        assert!(!(Rational64::from(2) * &d).is_prime());
        assert!(InvariantDivisor::prime(&e6(), RayRef::Apex(Sign::Plus)).is_err());
    }

    #[test]
    fn arithmetic_is_pointwise() {
        let x = pp();
        let a = InvariantDivisor::prime(&x, RayRef::Block { block: 0, index: 0 }).unwrap();
        let b = InvariantDivisor::prime(&x, RayRef::Apex(Sign::Plus)).unwrap();
        let sum = &a + &b;
        assert_eq!(
            sum.to_flat(),
            vec![1, 0, 0, 1, 0].into_iter().map(Rational64::from).collect::<Vec<_>>()
        );
        assert_eq!(&sum - &b, a);
        assert_eq!(&(-&a) + &a, InvariantDivisor::zero(&x));
        assert!(a.checked_add(&InvariantDivisor::zero(&e6())).is_err());
    }

    #[test]
    fn deleting_a_ray_shifts_later_coefficients() {
        let x = CStarSurface::new(
            vec![vec![1, 1, 1], vec![1]],
            vec![vec![1, 0, -1], vec![0]],
            Case::Pp,
        )
        .unwrap();
        let d = InvariantDivisor::prime(&x, RayRef::Block { block: 0, index: 2 }).unwrap();
        let deleted = d.delete_ray(RayRef::Block { block: 0, index: 1 }).unwrap();
        assert_eq!(deleted.as_prime(), Some(RayRef::Block { block: 0, index: 1 }));
        let y = x.contract(RayRef::Block { block: 0, index: 1 }).unwrap();
        assert!(deleted.fits(&y));

        let without_apex = d.delete_ray(RayRef::Apex(Sign::Plus)).unwrap();
        assert_eq!(without_apex.apex_coefficient(Sign::Plus), None);
        assert!(without_apex.delete_ray(RayRef::Apex(Sign::Plus)).is_err());
    }

    #[test]
    fn intersection_is_bilinear_in_flat_coefficients() {
        let x = e6();
        let flat: Vec<Rational64> = vec![1, 2, 0, 1].into_iter().map(Rational64::from).collect();
        let d = InvariantDivisor::from_flat(&x, &flat).unwrap();
        let m = x.intersection_matrix();
        let mut expected = Rational64::zero();
        for i in 0..4 {
            for j in 0..4 {
                expected += flat[i] * flat[j] * m[i][j];
            }
        }
        assert_eq!(d.self_intersection(&x).unwrap(), expected);
    }

    #[test]
    fn canonical_divisor_of_a_toric_surface() {
        // r = 1: the surface is toric and K = -Σ D_ρ
        let x = pp();
        let k = x.canonical_divisor();
        assert!(k.to_flat().iter().all(|c| *c == -Rational64::one()));
        // smooth toric surface with five rays
        assert_eq!(x.degree(), Rational64::from(7));
    }
}
