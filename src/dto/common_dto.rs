use serde::{Deserialize, Serialize};

use crate::repositories::PageWindow;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

// Respuesta estándar de las operaciones de escritura
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success_with_message(data: T, message: String) -> Self {
        Self {
            success: true,
            message: Some(message),
            data: Some(data),
        }
    }
}

// Parámetros de paginación (?page=&size=)
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Pagination {
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl Pagination {
    /// Página 1-based; el tamaño se limita a [1, MAX_PAGE_SIZE]
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn size(&self) -> u32 {
        self.size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn window(&self) -> PageWindow {
        let size = i64::from(self.size());
        PageWindow {
            limit: size,
            offset: (i64::from(self.page()) - 1) * size,
        }
    }
}

// Página de resultados
#[derive(Debug, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, pagination: Pagination, total: i64) -> Self {
        Self {
            items,
            page: pagination.page(),
            size: pagination.size(),
            total,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total: self.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults_and_limits() {
        let default = Pagination::default();
        assert_eq!(default.window(), PageWindow { limit: 20, offset: 0 });

        let large = Pagination { page: Some(3), size: Some(500) };
        assert_eq!(large.size(), MAX_PAGE_SIZE);
        assert_eq!(large.window(), PageWindow { limit: 100, offset: 200 });

        let zero = Pagination { page: Some(0), size: Some(0) };
        assert_eq!(zero.window(), PageWindow { limit: 1, offset: 0 });
    }
}
