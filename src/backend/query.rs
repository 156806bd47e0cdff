//! PostgREST-style query builder for table operations

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

/// Filters, ordering and limit for one table request
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    table: &'static str,
    select: &'static str,
    filters: Vec<(String, String)>,
    order: Vec<(String, Order)>,
    limit: Option<usize>,
    on_conflict: Option<&'static str>,
}

impl Query {
    pub fn table(table: &'static str) -> Self {
        Self {
            table,
            select: "*",
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
            on_conflict: None,
        }
    }

    pub fn select(mut self, columns: &'static str) -> Self {
        self.select = columns;
        self
    }

    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.filters
            .push((column.to_string(), format!("eq.{}", value.to_string())));
        self
    }

    pub fn lt(mut self, column: &str, value: impl ToString) -> Self {
        self.filters
            .push((column.to_string(), format!("lt.{}", value.to_string())));
        self
    }

    pub fn order(mut self, column: &str, order: Order) -> Self {
        self.order.push((column.to_string(), order));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn on_conflict(mut self, columns: &'static str) -> Self {
        self.on_conflict = Some(columns);
        self
    }

    pub fn table_name(&self) -> &'static str {
        self.table
    }

    /// Query-string pairs for reads
    pub fn read_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), self.select.to_string())];
        params.extend(self.filters.iter().cloned());
        if !self.order.is_empty() {
            let order = self
                .order
                .iter()
                .map(|(col, dir)| match dir {
                    Order::Asc => format!("{}.asc", col),
                    Order::Desc => format!("{}.desc", col),
                })
                .collect::<Vec<_>>()
                .join(",");
            params.push(("order".to_string(), order));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }

    /// Query-string pairs for writes (filters and conflict target only)
    pub fn write_params(&self) -> Vec<(String, String)> {
        let mut params = self.filters.clone();
        if let Some(cols) = self.on_conflict {
            params.push(("on_conflict".to_string(), cols.to_string()));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_params_previous_workout() {
        let q = Query::table("workout_logs")
            .select("id,completed_at")
            .eq("user_id", "u1")
            .eq("workout_day_id", 2)
            .lt("week_number", 3)
            .order("week_number", Order::Desc)
            .limit(1);

        assert_eq!(
            q.read_params(),
            vec![
                ("select".to_string(), "id,completed_at".to_string()),
                ("user_id".to_string(), "eq.u1".to_string()),
                ("workout_day_id".to_string(), "eq.2".to_string()),
                ("week_number".to_string(), "lt.3".to_string()),
                ("order".to_string(), "week_number.desc".to_string()),
                ("limit".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn test_multi_column_order() {
        let q = Query::table("exercise_logs")
            .eq("workout_log_id", "w")
            .order("exercise_id", Order::Asc)
            .order("set_number", Order::Asc);
        let params = q.read_params();
        assert!(params.contains(&("order".to_string(), "exercise_id.asc,set_number.asc".to_string())));
        assert_eq!(params[0], ("select".to_string(), "*".to_string()));
    }

    #[test]
    fn test_write_params_upsert() {
        let q = Query::table("personal_records").on_conflict("user_id,exercise_id");
        assert_eq!(
            q.write_params(),
            vec![("on_conflict".to_string(), "user_id,exercise_id".to_string())]
        );
        assert_eq!(q.table_name(), "personal_records");
    }
}
