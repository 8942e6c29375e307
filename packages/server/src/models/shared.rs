use std::str::FromStr;

use sea_orm::{ColumnTrait, Order};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AppError;

pub const DEFAULT_PAGE_NO: i64 = 1;
pub const DEFAULT_PER_PAGE: u64 = 20;
pub const MAX_PER_PAGE: u64 = 100;
pub const DEFAULT_ORDER_BY: &str = "id";

/// Pagination query parameters shared by every list endpoint.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    /// 1-based page number. Default: 1.
    pub page_no: Option<i64>,
    /// Page size, 1-100. Default: 20.
    pub per_page: Option<u64>,
    /// Column to order by. Default: `id`.
    pub order_by: Option<String>,
    /// `asc` or `desc`. Default: `asc`.
    pub order_dir: Option<String>,
}

/// Validated form of [`PageParams`].
#[derive(Debug, Clone)]
pub struct Page<C> {
    pub page_no: i64,
    pub per_page: u64,
    pub order_by: C,
    pub order: Order,
}

impl<C> Page<C> {
    /// Rows to skip, or `None` when the page lies before the first one or so
    /// far past the end that the offset would not fit in a signed 64-bit value.
    pub fn offset(&self) -> Option<u64> {
        let skipped = u64::try_from(self.page_no).ok()?.checked_sub(1)?;
        let offset = skipped.checked_mul(self.per_page)?;
        (offset <= i64::MAX as u64).then_some(offset)
    }
}

impl PageParams {
    /// Resolve defaults and check `order_by` against the entity's columns.
    pub fn resolve<C: ColumnTrait>(&self) -> Result<Page<C>, AppError> {
        self.resolve_except(&[])
    }

    /// Like [`PageParams::resolve`], with `hidden` columns rejected as unknown.
    pub fn resolve_except<C: ColumnTrait>(&self, hidden: &[&str]) -> Result<Page<C>, AppError> {
        self.resolve_with(|name| {
            if hidden.contains(&name) {
                None
            } else {
                C::from_str(name).ok()
            }
        })
    }

    /// Like [`PageParams::resolve`] with a custom `order_by` lookup.
    pub fn resolve_with<C>(&self, column: impl Fn(&str) -> Option<C>) -> Result<Page<C>, AppError> {
        let per_page = self.per_page.unwrap_or(DEFAULT_PER_PAGE);
        if !(1..=MAX_PER_PAGE).contains(&per_page) {
            return Err(AppError::field(
                "per_page",
                "range",
                format!("per_page must be between 1 and {MAX_PER_PAGE}"),
            ));
        }

        let order_by_name = self.order_by.as_deref().unwrap_or(DEFAULT_ORDER_BY);
        let order_by = column(order_by_name).ok_or_else(|| {
            AppError::field(
                "order_by",
                "oneof",
                format!("cannot order by '{order_by_name}'"),
            )
        })?;

        let order = match self.order_dir.as_deref().map(str::to_ascii_lowercase).as_deref() {
            None | Some("asc") => Order::Asc,
            Some("desc") => Order::Desc,
            Some(_) => {
                return Err(AppError::field(
                    "order_dir",
                    "oneof",
                    "order_dir must be one of: asc, desc",
                ));
            }
        };

        Ok(Page {
            page_no: self.page_no.unwrap_or(DEFAULT_PAGE_NO),
            per_page,
            order_by,
            order,
        })
    }
}

/// Page metadata included in list responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct PaginationInfo {
    /// Records on this page.
    #[schema(example = 20)]
    pub count: u64,
    /// Records matching the filters across all pages.
    #[schema(example = 47)]
    pub total_count: u64,
    /// Never less than 1, even for an empty result.
    #[schema(example = 3)]
    pub total_pages: i64,
    #[schema(example = 1)]
    pub current_page: i64,
    #[schema(example = 2)]
    pub next_page: Option<i64>,
    pub prev_page: Option<i64>,
    pub is_first_page: bool,
    pub is_last_page: bool,
    pub is_out_of_range_page: bool,
}

impl PaginationInfo {
    pub fn new(count: u64, total_count: u64, page_no: i64, per_page: u64) -> Self {
        let total_pages = (total_count.div_ceil(per_page.max(1)) as i64).max(1);

        let next_page = if page_no >= total_pages || page_no < 0 {
            None
        } else {
            Some(page_no + 1)
        };
        let prev_page = if page_no <= 1 || page_no > total_pages + 1 {
            None
        } else {
            Some(page_no - 1)
        };

        Self {
            count,
            total_count,
            total_pages,
            current_page: page_no,
            next_page,
            prev_page,
            is_first_page: page_no == 1,
            is_last_page: page_no == total_pages,
            is_out_of_range_page: page_no > total_pages || page_no < 1,
        }
    }
}

/// Envelope of every list response.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination_info: PaginationInfo,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, total_count: u64, page_no: i64, per_page: u64) -> Self {
        let pagination_info = PaginationInfo::new(data.len() as u64, total_count, page_no, per_page);
        Self {
            data,
            pagination_info,
        }
    }
}

/// Empty JSON object, returned by deletes.
#[derive(Debug, Default, Serialize, utoipa::ToSchema)]
pub struct Empty {}

/// Escape LIKE wildcard characters in a search string.
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Deserialize `ids=1,2,3` into a list. Blank items are skipped.
pub fn comma_separated<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| item.parse::<T>().map_err(serde::de::Error::custom))
            .collect()
    })
    .transpose()
}
