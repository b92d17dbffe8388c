// ============================================
// File: crates/robolink-core/src/crypto/curve.rs
// ============================================
//! # Short-Weierstrass Curve Arithmetic
//!
//! ## Creation Reason
//! The key exchange runs over a custom curve that no crypto crate ships,
//! and the signature scheme must expose its raw nonce to model the
//! per-signer policy. Both need plain affine arithmetic over
//! `y² = x³ + a·x + b (mod p)`.
//!
//! ## Main Functionality
//! - `CurveParams`: prime, coefficients, generator and optional order
//! - `RawPoint`: untyped affine point or the point at infinity
//! - `add` / `double` / `scalar_multiply`: free functions over `CurveParams`
//! - `Point<C>`: curve-tagged point; `Point<KexCurve>` and `Point<P256>`
//!   are different types
//!
//! ## Point Addition Cases
//! ```text
//! P + O        = P
//! O + Q        = Q
//! P + (-P)     = O                (vertical secant / tangent)
//! P + P        = double(P)        λ = (3x² + a) / 2y
//! P + Q        = general          λ = (y₂ - y₁) / (x₂ - x₁)
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - NOT constant-time. Never reuse this for anything that must resist
//!   side channels
//! - Division uses Fermat inversion, so every modulus here MUST be prime
//! - The key-exchange curve has no known group order; `mul_signed`
//!   rejects negative scalars there
//!
//! ## Last Modified
//! v0.1.0 - Initial curve arithmetic

use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::OnceLock;

use num_bigint::{BigInt, BigUint, Sign};
use num_integer::Integer;
use num_traits::Zero;

use crate::error::{CoreError, Result};

// ============================================
// Curve Constants
// ============================================

/// Name of the custom key-exchange curve.
pub const KEX_CURVE_NAME: &str = "robolink-kex";

/// Name of the signature curve.
pub const P256_CURVE_NAME: &str = "P-256";

const KEX_P: [u8; 32] = [
    0x9e, 0x95, 0xd5, 0x14, 0x90, 0x23, 0x91, 0x94, 0x27, 0x2b, 0x61, 0xc1, 0xaf, 0xc0, 0x56, 0xa3,
    0x32, 0x01, 0x54, 0x9e, 0x9e, 0x10, 0x4b, 0x4e, 0x00, 0x99, 0x66, 0x5f, 0x7f, 0x44, 0x76, 0x7b,
];
const KEX_GX: [u8; 32] = [
    0x79, 0x90, 0x22, 0x02, 0xfb, 0xf0, 0x71, 0x5a, 0x80, 0x9f, 0xb9, 0xeb, 0x0b, 0x23, 0xb6, 0x0e,
    0x64, 0x24, 0x6e, 0xf0, 0x3c, 0x15, 0xc5, 0x94, 0xcc, 0x26, 0xca, 0xa7, 0x02, 0x2d, 0xaf, 0x70,
];
const KEX_GY: [u8; 32] = [
    0x1f, 0xac, 0x97, 0xfc, 0xfb, 0x7b, 0x4d, 0xe7, 0x84, 0xbe, 0x79, 0xdb, 0xe4, 0xa0, 0xc8, 0xb6,
    0x7d, 0xd9, 0xf1, 0xf6, 0x4b, 0xb1, 0x59, 0xe3, 0x5a, 0x1d, 0xba, 0xf7, 0xec, 0x37, 0x2a, 0x97,
];

const P256_P: [u8; 32] = [
    0xff, 0xff, 0xff, 0xff, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
];
const P256_B: [u8; 32] = [
    0x5a, 0xc6, 0x35, 0xd8, 0xaa, 0x3a, 0x93, 0xe7, 0xb3, 0xeb, 0xbd, 0x55, 0x76, 0x98, 0x86, 0xbc,
    0x65, 0x1d, 0x06, 0xb0, 0xcc, 0x53, 0xb0, 0xf6, 0x3b, 0xce, 0x3c, 0x3e, 0x27, 0xd2, 0x60, 0x4b,
];
const P256_N: [u8; 32] = [
    0xff, 0xff, 0xff, 0xff, 0x00, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xbc, 0xe6, 0xfa, 0xad, 0xa7, 0x17, 0x9e, 0x84, 0xf3, 0xb9, 0xca, 0xc2, 0xfc, 0x63, 0x25, 0x51,
];
const P256_GX: [u8; 32] = [
    0x6b, 0x17, 0xd1, 0xf2, 0xe1, 0x2c, 0x42, 0x47, 0xf8, 0xbc, 0xe6, 0xe5, 0x63, 0xa4, 0x40, 0xf2,
    0x77, 0x03, 0x7d, 0x81, 0x2d, 0xeb, 0x33, 0xa0, 0xf4, 0xa1, 0x39, 0x45, 0xd8, 0x98, 0xc2, 0x96,
];
const P256_GY: [u8; 32] = [
    0x4f, 0xe3, 0x42, 0xe2, 0xfe, 0x1a, 0x7f, 0x9b, 0x8e, 0xe7, 0xeb, 0x4a, 0x7c, 0x0f, 0x9e, 0x16,
    0x2b, 0xce, 0x33, 0x57, 0x6b, 0x31, 0x5e, 0xce, 0xcb, 0xb6, 0x40, 0x68, 0x37, 0xbf, 0x51, 0xf5,
];

// ============================================
// CurveParams
// ============================================

/// Domain parameters of a short-Weierstrass curve over a prime field.
#[derive(Clone, PartialEq, Eq)]
pub struct CurveParams {
    /// Human-readable curve name, used in errors and logs
    pub name: &'static str,
    /// Field prime
    pub p: BigUint,
    /// Coefficient `a`, normalized into `[0, p)`
    pub a: BigUint,
    /// Coefficient `b`, normalized into `[0, p)`
    pub b: BigUint,
    /// Generator x-coordinate
    pub gx: BigUint,
    /// Generator y-coordinate
    pub gy: BigUint,
    /// Order of the generator, when known
    pub order: Option<BigUint>,
}

impl CurveParams {
    /// Builds parameters, reducing `a` and `b` into the field.
    ///
    /// A negative `a` (such as `-3`) is accepted and stored as `p + a`.
    #[must_use]
    pub fn new(
        name: &'static str,
        p: BigUint,
        a: &BigInt,
        b: &BigInt,
        gx: BigUint,
        gy: BigUint,
        order: Option<BigUint>,
    ) -> Self {
        let modulus = BigInt::from_biguint(Sign::Plus, p.clone());
        let a = to_field(a, &modulus);
        let b = to_field(b, &modulus);
        Self {
            name,
            p,
            a,
            b,
            gx,
            gy,
            order,
        }
    }

    /// Returns `true` if `(x, y)` lies on the curve with both coordinates
    /// already reduced into `[0, p)`.
    #[must_use]
    pub fn contains(&self, x: &BigUint, y: &BigUint) -> bool {
        if x >= &self.p || y >= &self.p {
            return false;
        }
        let lhs = (y * y) % &self.p;
        let rhs = (x * x * x + &self.a * x + &self.b) % &self.p;
        lhs == rhs
    }

    /// Returns the generator as a raw point.
    #[must_use]
    pub fn generator(&self) -> RawPoint {
        RawPoint::Affine {
            x: self.gx.clone(),
            y: self.gy.clone(),
        }
    }

    /// Returns `true` if `point` is infinity or satisfies the curve equation.
    #[must_use]
    pub fn is_valid(&self, point: &RawPoint) -> bool {
        match point {
            RawPoint::Infinity => true,
            RawPoint::Affine { x, y } => self.contains(x, y),
        }
    }
}

impl fmt::Debug for CurveParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurveParams")
            .field("name", &self.name)
            .field("bits", &self.p.bits())
            .field("order_known", &self.order.is_some())
            .finish_non_exhaustive()
    }
}

fn to_field(value: &BigInt, modulus: &BigInt) -> BigUint {
    // mod_floor keeps the result non-negative for negative inputs
    let reduced = value.mod_floor(modulus);
    reduced.magnitude().clone()
}

/// Parameters of the custom key-exchange curve (`a = -3`, `b = 2`).
pub fn kex_params() -> &'static CurveParams {
    static PARAMS: OnceLock<CurveParams> = OnceLock::new();
    PARAMS.get_or_init(|| {
        CurveParams::new(
            KEX_CURVE_NAME,
            BigUint::from_bytes_be(&KEX_P),
            &BigInt::from(-3),
            &BigInt::from(2),
            BigUint::from_bytes_be(&KEX_GX),
            BigUint::from_bytes_be(&KEX_GY),
            None,
        )
    })
}

/// Parameters of NIST P-256 (secp256r1).
pub fn p256_params() -> &'static CurveParams {
    static PARAMS: OnceLock<CurveParams> = OnceLock::new();
    PARAMS.get_or_init(|| {
        CurveParams::new(
            P256_CURVE_NAME,
            BigUint::from_bytes_be(&P256_P),
            &BigInt::from(-3),
            &BigInt::from_bytes_be(Sign::Plus, &P256_B),
            BigUint::from_bytes_be(&P256_GX),
            BigUint::from_bytes_be(&P256_GY),
            Some(BigUint::from_bytes_be(&P256_N)),
        )
    })
}

/// Order of the P-256 generator.
pub fn p256_order() -> &'static BigUint {
    static ORDER: OnceLock<BigUint> = OnceLock::new();
    ORDER.get_or_init(|| BigUint::from_bytes_be(&P256_N))
}

// ============================================
// RawPoint & Arithmetic
// ============================================

/// Affine point without a curve tag.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum RawPoint {
    /// The identity element
    Infinity,
    /// Finite point with coordinates in `[0, p)`
    Affine {
        /// x-coordinate
        x: BigUint,
        /// y-coordinate
        y: BigUint,
    },
}

impl RawPoint {
    /// Returns `true` for the point at infinity.
    #[must_use]
    pub const fn is_infinity(&self) -> bool {
        matches!(self, Self::Infinity)
    }

    /// Returns the coordinates of a finite point.
    #[must_use]
    pub fn coordinates(&self) -> Option<(&BigUint, &BigUint)> {
        match self {
            Self::Infinity => None,
            Self::Affine { x, y } => Some((x, y)),
        }
    }
}

impl fmt::Debug for RawPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Infinity => write!(f, "Infinity"),
            Self::Affine { x, y } => write!(f, "({x:#x}, {y:#x})"),
        }
    }
}

/// Modular inverse by Fermat's little theorem. `modulus` must be prime
/// and `value` must not be a multiple of it.
pub(crate) fn inv_mod(value: &BigUint, modulus: &BigUint) -> BigUint {
    let exponent = modulus - 2u32;
    value.modpow(&exponent, modulus)
}

fn sub_mod(lhs: &BigUint, rhs: &BigUint, modulus: &BigUint) -> BigUint {
    ((lhs % modulus) + modulus - (rhs % modulus)) % modulus
}

/// Returns `-P`.
#[must_use]
pub fn negate(params: &CurveParams, point: &RawPoint) -> RawPoint {
    match point {
        RawPoint::Infinity => RawPoint::Infinity,
        RawPoint::Affine { x, y } => RawPoint::Affine {
            x: x.clone(),
            y: sub_mod(&BigUint::zero(), y, &params.p),
        },
    }
}

/// Adds two points of the same curve.
#[must_use]
pub fn add(params: &CurveParams, lhs: &RawPoint, rhs: &RawPoint) -> RawPoint {
    let (x1, y1, x2, y2) = match (lhs, rhs) {
        (RawPoint::Infinity, other) | (other, RawPoint::Infinity) => return other.clone(),
        (RawPoint::Affine { x: x1, y: y1 }, RawPoint::Affine { x: x2, y: y2 }) => (x1, y1, x2, y2),
    };
    let p = &params.p;

    if x1 == x2 {
        if ((y1 + y2) % p).is_zero() {
            return RawPoint::Infinity;
        }
        return double(params, lhs);
    }

    let slope = (sub_mod(y2, y1, p) * inv_mod(&sub_mod(x2, x1, p), p)) % p;
    chord_result(p, &slope, x1, y1, x2)
}

/// Doubles a point.
#[must_use]
pub fn double(params: &CurveParams, point: &RawPoint) -> RawPoint {
    let (x, y) = match point {
        RawPoint::Infinity => return RawPoint::Infinity,
        RawPoint::Affine { x, y } => (x, y),
    };
    let p = &params.p;

    if y.is_zero() {
        return RawPoint::Infinity;
    }

    let numerator = (BigUint::from(3u32) * x * x + &params.a) % p;
    let denominator = (BigUint::from(2u32) * y) % p;
    let slope = (numerator * inv_mod(&denominator, p)) % p;
    chord_result(p, &slope, x, y, x)
}

fn chord_result(
    p: &BigUint,
    slope: &BigUint,
    x1: &BigUint,
    y1: &BigUint,
    x2: &BigUint,
) -> RawPoint {
    let x3 = sub_mod(&sub_mod(&(slope * slope), x1, p), x2, p);
    let y3 = sub_mod(&(slope * sub_mod(x1, &x3, p)), y1, p);
    RawPoint::Affine { x: x3, y: y3 }
}

/// Multiplies a point by a non-negative scalar using double-and-add,
/// scanning the scalar from its least significant bit.
#[must_use]
pub fn scalar_multiply(params: &CurveParams, point: &RawPoint, scalar: &BigUint) -> RawPoint {
    let mut result = RawPoint::Infinity;
    let mut addend = point.clone();

    for bit in 0..scalar.bits() {
        if scalar.bit(bit) {
            result = add(params, &result, &addend);
        }
        addend = double(params, &addend);
    }
    result
}

// ============================================
// Typed Curves
// ============================================

/// Marker trait tying a zero-sized type to a set of curve parameters.
pub trait Curve: Copy + Clone + fmt::Debug + PartialEq + Eq + Hash + Send + Sync + 'static {
    /// Returns the curve's domain parameters.
    fn params() -> &'static CurveParams;
}

/// The custom curve used for key exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KexCurve;

impl Curve for KexCurve {
    fn params() -> &'static CurveParams {
        kex_params()
    }
}

/// NIST P-256, used for command signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct P256;

impl Curve for P256 {
    fn params() -> &'static CurveParams {
        p256_params()
    }
}

// ============================================
// Point<C>
// ============================================

/// Point on curve `C`.
///
/// Every constructed value is either infinity or satisfies the curve
/// equation, and arithmetic only combines points of the same curve.
///
/// # Example
/// ```
/// use num_bigint::BigUint;
/// use robolink_core::crypto::{KexCurve, Point};
///
/// let g = Point::<KexCurve>::generator();
/// let two_g = g.mul(&BigUint::from(2u32));
/// assert_eq!(two_g, g.add(&g));
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Point<C: Curve> {
    inner: RawPoint,
    _curve: PhantomData<C>,
}

impl<C: Curve> Point<C> {
    fn wrap(inner: RawPoint) -> Self {
        Self {
            inner,
            _curve: PhantomData,
        }
    }

    /// Validates coordinates and builds a finite point.
    ///
    /// # Errors
    /// Returns `InvalidPoint` if a coordinate is out of range or the
    /// pair does not satisfy the curve equation.
    pub fn new(x: BigUint, y: BigUint) -> Result<Self> {
        let params = C::params();
        if x >= params.p || y >= params.p {
            return Err(CoreError::invalid_point(
                params.name,
                "coordinate not reduced modulo p",
            ));
        }
        if !params.contains(&x, &y) {
            return Err(CoreError::invalid_point(params.name, "not on curve"));
        }
        Ok(Self::wrap(RawPoint::Affine { x, y }))
    }

    /// Returns the point at infinity.
    #[must_use]
    pub fn infinity() -> Self {
        Self::wrap(RawPoint::Infinity)
    }

    /// Returns the curve generator.
    #[must_use]
    pub fn generator() -> Self {
        Self::wrap(C::params().generator())
    }

    /// Returns `true` for the point at infinity.
    #[must_use]
    pub const fn is_infinity(&self) -> bool {
        self.inner.is_infinity()
    }

    /// Returns the x-coordinate of a finite point.
    #[must_use]
    pub fn x(&self) -> Option<&BigUint> {
        self.inner.coordinates().map(|(x, _)| x)
    }

    /// Returns the y-coordinate of a finite point.
    #[must_use]
    pub fn y(&self) -> Option<&BigUint> {
        self.inner.coordinates().map(|(_, y)| y)
    }

    /// Returns the untyped representation.
    #[must_use]
    pub const fn raw(&self) -> &RawPoint {
        &self.inner
    }

    /// `self + other`.
    #[must_use]
    pub fn add(&self, other: &Self) -> Self {
        Self::wrap(add(C::params(), &self.inner, &other.inner))
    }

    /// `2 · self`.
    #[must_use]
    pub fn double(&self) -> Self {
        Self::wrap(double(C::params(), &self.inner))
    }

    /// `-self`.
    #[must_use]
    pub fn negate(&self) -> Self {
        Self::wrap(negate(C::params(), &self.inner))
    }

    /// `scalar · self` for a non-negative scalar.
    #[must_use]
    pub fn mul(&self, scalar: &BigUint) -> Self {
        Self::wrap(scalar_multiply(C::params(), &self.inner, scalar))
    }

    /// `scalar · self` for a signed scalar.
    ///
    /// Negative scalars are reduced modulo the group order.
    ///
    /// # Errors
    /// Returns `InvalidScalar` for a negative scalar on a curve whose
    /// order is unknown.
    pub fn mul_signed(&self, scalar: &BigInt) -> Result<Self> {
        let params = C::params();
        match scalar.sign() {
            Sign::Minus => {
                let order = params.order.as_ref().ok_or_else(|| {
                    CoreError::invalid_scalar(format!(
                        "negative scalar on {} with unknown group order",
                        params.name
                    ))
                })?;
                let modulus = BigInt::from_biguint(Sign::Plus, order.clone());
                let reduced = scalar.mod_floor(&modulus);
                Ok(self.mul(reduced.magnitude()))
            }
            _ => Ok(self.mul(scalar.magnitude())),
        }
    }
}

impl<C: Curve> fmt::Debug for Point<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Point<{}>{:?}", C::params().name, self.inner)
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::One;

    fn kex_g() -> Point<KexCurve> {
        Point::generator()
    }

    #[test]
    fn test_generators_on_curve() {
        assert!(kex_params().is_valid(&kex_params().generator()));
        assert!(p256_params().is_valid(&p256_params().generator()));
    }

    #[test]
    fn test_kex_coefficients_normalized() {
        let params = kex_params();
        assert_eq!(&params.a + 3u32, params.p);
        assert_eq!(params.b, BigUint::from(2u32));
        assert!(params.order.is_none());
    }

    #[test]
    fn test_identity_laws() {
        let g = kex_g();
        let o = Point::<KexCurve>::infinity();
        assert_eq!(g.add(&o), g);
        assert_eq!(o.add(&g), g);
        assert!(g.add(&g.negate()).is_infinity());
    }

    #[test]
    fn test_scalar_edge_cases() {
        let g = kex_g();
        assert!(g.mul(&BigUint::zero()).is_infinity());
        assert_eq!(g.mul(&BigUint::one()), g);
        assert_eq!(g.mul(&BigUint::from(2u32)), g.double());
        assert!(Point::<KexCurve>::infinity().mul(&BigUint::from(7u32)).is_infinity());
    }

    #[test]
    fn test_scalar_multiply_matches_repeated_addition() {
        let g = kex_g();
        let mut acc = Point::<KexCurve>::infinity();
        for _ in 0..13 {
            acc = acc.add(&g);
        }
        assert_eq!(g.mul(&BigUint::from(13u32)), acc);
        assert!(kex_params().is_valid(acc.raw()));
    }

    #[test]
    fn test_scalar_multiply_distributes() {
        let g = kex_g();
        let a = BigUint::from(123_457u32);
        let b = BigUint::from(654_321u32);
        let lhs = g.mul(&(&a + &b));
        let rhs = g.mul(&a).add(&g.mul(&b));
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn test_p256_order_annihilates_generator() {
        let g = Point::<P256>::generator();
        let n = p256_params().order.clone().unwrap();
        assert!(g.mul(&n).is_infinity());
        assert_eq!(g.mul(&(&n + 1u32)), g);
    }

    #[test]
    fn test_p256_known_double() {
        // 2G for P-256
        let x = BigUint::parse_bytes(
            b"7cf27b188d034f7e8a52380304b51ac3c08969e277f21b35a60b48fc47669978",
            16,
        )
        .unwrap();
        let y = BigUint::parse_bytes(
            b"07775510db8ed040293d9ac69f7430dbba7dade63ce982299e04b79d227873d1",
            16,
        )
        .unwrap();
        let expected = Point::<P256>::new(x, y).unwrap();
        assert_eq!(Point::<P256>::generator().double(), expected);
    }

    #[test]
    fn test_mul_signed() {
        let g = Point::<P256>::generator();
        let neg = g.mul_signed(&BigInt::from(-1)).unwrap();
        assert_eq!(neg, g.negate());

        let kex = kex_g();
        assert!(matches!(
            kex.mul_signed(&BigInt::from(-5)),
            Err(CoreError::InvalidScalar { .. })
        ));
        assert_eq!(kex.mul_signed(&BigInt::from(5)).unwrap(), kex.mul(&BigUint::from(5u32)));
    }

    #[test]
    fn test_point_new_rejects_off_curve() {
        let params = kex_params();
        let bad_y = (&params.gy + 1u32) % &params.p;
        let err = Point::<KexCurve>::new(params.gx.clone(), bad_y).unwrap_err();
        assert!(matches!(err, CoreError::InvalidPoint { curve: KEX_CURVE_NAME, .. }));

        let err = Point::<KexCurve>::new(params.p.clone(), BigUint::zero()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidPoint { .. }));
    }
}
