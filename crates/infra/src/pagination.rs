#[derive(Debug, Clone, Copy)]
pub struct LimitOffset {
    pub limit: i64,
    pub offset: i64,
}

impl LimitOffset {
    /// Builds a page from raw client input, clamping the limit to `1..=max`
    /// and the offset to non-negative.
    pub fn page(limit: Option<i64>, offset: Option<i64>, max: i64) -> Self {
        Self {
            limit: limit.unwrap_or(50).clamp(1, max),
            offset: offset.unwrap_or(0).max(0),
        }
    }
}

impl Default for LimitOffset {
    fn default() -> Self {
        Self {
            limit: 50,
            offset: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_clamps_limit_and_offset() {
        let p = LimitOffset::page(Some(500), Some(-3), 100);
        assert_eq!(p.limit, 100);
        assert_eq!(p.offset, 0);

        let p = LimitOffset::page(None, None, 100);
        assert_eq!(p.limit, 50);
        assert_eq!(p.offset, 0);

        let p = LimitOffset::page(Some(0), Some(20), 100);
        assert_eq!(p.limit, 1);
        assert_eq!(p.offset, 20);
    }
}
