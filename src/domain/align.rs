//! Inner-join alignment of price series on their common dates.

use std::cmp::Ordering;

use chrono::NaiveDate;

use crate::domain::series::Series;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignedPoint {
    pub date: NaiveDate,
    pub a: f64,
    pub b: f64,
}

/// Two series reduced to the dates both of them carry.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedPair {
    pub a_symbol: String,
    pub b_symbol: String,
    pub points: Vec<AlignedPoint>,
}

impl AlignedPair {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn a_values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.a).collect()
    }

    pub fn b_values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.b).collect()
    }

    pub fn swapped(&self) -> Self {
        Self {
            a_symbol: self.b_symbol.clone(),
            b_symbol: self.a_symbol.clone(),
            points: self
                .points
                .iter()
                .map(|p| AlignedPoint {
                    date: p.date,
                    a: p.b,
                    b: p.a,
                })
                .collect(),
        }
    }
}

/// Merge-join two date-sorted series.
pub fn align(a: &Series, b: &Series) -> AlignedPair {
    let (xs, ys) = (a.points(), b.points());
    let mut points = Vec::with_capacity(xs.len().min(ys.len()));
    let (mut i, mut j) = (0, 0);

    while i < xs.len() && j < ys.len() {
        match xs[i].date.cmp(&ys[j].date) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                if !xs[i].is_missing() && !ys[j].is_missing() {
                    points.push(AlignedPoint {
                        date: xs[i].date,
                        a: xs[i].price,
                        b: ys[j].price,
                    });
                }
                i += 1;
                j += 1;
            }
        }
    }

    AlignedPair {
        a_symbol: a.symbol().to_string(),
        b_symbol: b.symbol().to_string(),
        points,
    }
}

/// Any number of series reduced to their common dates.
///
/// `columns[k][row]` is the price of `symbols[k]` on `dates[row]`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AlignedFrame {
    pub symbols: Vec<String>,
    pub dates: Vec<NaiveDate>,
    pub columns: Vec<Vec<f64>>,
}

impl AlignedFrame {
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Project two columns into an [`AlignedPair`].
    pub fn pair(&self, a: usize, b: usize) -> Option<AlignedPair> {
        let (xs, ys) = (self.columns.get(a)?, self.columns.get(b)?);
        Some(AlignedPair {
            a_symbol: self.symbols[a].clone(),
            b_symbol: self.symbols[b].clone(),
            points: self
                .dates
                .iter()
                .zip(xs.iter().zip(ys))
                .map(|(&date, (&a, &b))| AlignedPoint { date, a, b })
                .collect(),
        })
    }
}

/// Inner join over every input: a date survives only if all series price it.
pub fn align_all(series: &[&Series]) -> AlignedFrame {
    let symbols: Vec<String> = series.iter().map(|s| s.symbol().to_string()).collect();
    let Some((first, rest)) = series.split_first() else {
        return AlignedFrame::default();
    };

    let mut dates = Vec::new();
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); series.len()];

    'dates: for point in first.points() {
        if point.is_missing() {
            continue;
        }
        let mut row = Vec::with_capacity(series.len());
        row.push(point.price);
        for other in rest {
            match other.price_on(point.date) {
                Some(price) if price.is_finite() => row.push(price),
                _ => continue 'dates,
            }
        }
        dates.push(point.date);
        for (column, price) in columns.iter_mut().zip(row) {
            column.push(price);
        }
    }

    AlignedFrame {
        symbols,
        dates,
        columns,
    }
}
