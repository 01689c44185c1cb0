//! Integration tests: CSV exports → warehouse → analytics → report backends

#[cfg(test)]
mod report_pipeline_tests {
    use chrono::NaiveDate;
    use rusqlite::Connection;
    use salesflow::analytics::{AnalysisOutput, AnalyticsEngine, CustomerSegment, SegmentThresholds};
    use salesflow::config::BackendType;
    use salesflow::output::ReportWriter;
    use salesflow::warehouse::load_warehouse;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::{tempdir, TempDir};

    const CUSTOMERS: &str = "\
customer_key,customer_id,customer_number,first_name,last_name,country,marital_status,gender,birthdate,create_date
1,11000,AW00011000,Jon,Yang,Australia,Married,Male,1971-10-06,2025-10-06
2,11001,AW00011001,Eugene,Huang,Australia,Single,Male,1976-05-10,2025-10-06
3,11002,AW00011002,Ruben,Torres,Australia,Married,Male,,2025-10-06
";

    const PRODUCTS: &str = "\
product_key,product_id,product_number,product_name,category_id,category,subcategory,maintenance,cost,product_line,start_date
10,210,BK-R93R-62,Road-150 Red- 62,BI_RB,Bikes,Road Bikes,Yes,2171,Road,2011-07-01
20,211,HL-U509,Sport-100 Helmet,AC_HE,Accessories,Helmets,No,13,Other Sales,2011-07-01
30,212,FR-R92B-58,HL Road Frame,CO_RF,Components,Road Frames,Yes,,Road,2011-07-01
";

    // Customer 1 buys across 14 calendar months and spends 6000; one line is malformed
    const SALES: &str = "\
order_number,product_key,customer_key,order_date,shipping_date,due_date,sales_amount,quantity,price
SO43697,10,1,2012-01-10,2012-01-17,2012-01-22,2000,1,2000
SO45000,20,1,2012-06-01,2012-06-08,2012-06-13,1000,2,500
SO51000,10,1,2013-02-15,2013-02-22,2013-02-27,3000,1,3000
SO51001,20,2,2013-02-20,2013-02-27,2013-03-04,500,1,500
SO51002,20,99,,,,40,1,40
SO51003,20,2,2013-03-01,2013-03-08,2013-03-13,not-a-number,1,40
";

    fn write_inputs(dir: &Path) -> (PathBuf, PathBuf, PathBuf) {
        let customers = dir.join("gold.dim_customers.csv");
        let products = dir.join("gold.dim_products.csv");
        let sales = dir.join("gold.fact_sales.csv");
        fs::write(&customers, CUSTOMERS).unwrap();
        fs::write(&products, PRODUCTS).unwrap();
        fs::write(&sales, SALES).unwrap();
        (customers, products, sales)
    }

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2014, 1, 1).unwrap()
    }

    fn load_and_run(dir: &TempDir) -> AnalysisOutput {
        let (customers, products, sales) = write_inputs(dir.path());
        let (warehouse, stats) = load_warehouse(&customers, &products, &sales).unwrap();

        assert_eq!(stats.customers_loaded, 3);
        assert_eq!(stats.products_loaded, 3);
        assert_eq!(stats.sales_loaded, 5);
        assert_eq!(stats.sales_skipped, 1);
        assert_eq!(warehouse.missing_customer_refs(), 1);

        AnalyticsEngine::new(SegmentThresholds::default(), as_of()).run(&warehouse)
    }

    #[test]
    fn test_end_to_end_segments_and_reports() {
        let dir = tempdir().unwrap();
        let output = load_and_run(&dir);

        // Unmatched and undated sale still counts toward the headline totals
        assert_eq!(output.key_metrics.total_sales, 6540.0);
        assert_eq!(output.key_metrics.total_customers, 3);
        assert_eq!(output.key_metrics.customers_ordered, 3);

        let jon = output
            .customer_report
            .iter()
            .find(|r| r.customer_key == 1)
            .unwrap();
        assert_eq!(jon.customer_name, "Jon Yang");
        assert_eq!(jon.total_sales, 6000.0);
        assert_eq!(jon.lifespan_months, Some(13));
        assert_eq!(jon.customer_segment, CustomerSegment::Vip);
        assert_eq!(jon.recency_months, Some(11));
        assert_eq!(jon.age, Some(43));

        let ruben = output
            .customer_report
            .iter()
            .find(|r| r.customer_key == 3)
            .unwrap();
        assert_eq!(ruben.total_orders, 0);
        assert_eq!(ruben.avg_order_value, 0.0);
        assert_eq!(ruben.customer_segment, CustomerSegment::New);

        let frame = output
            .product_report
            .iter()
            .find(|r| r.product_key == 30)
            .unwrap();
        assert_eq!(frame.cost, 0.0);
        assert_eq!(frame.total_sales, 0.0);

        // Undated sale is excluded from yearly grouping
        let yearly_total: f64 = output.sales_by_year.iter().map(|y| y.total_sales).sum();
        assert_eq!(yearly_total, 6500.0);
    }

    #[test]
    fn test_jsonl_backend_writes_every_table() {
        let dir = tempdir().unwrap();
        let output = load_and_run(&dir);
        let out_dir = dir.path().join("reports");

        {
            let mut writer = ReportWriter::new(BackendType::Jsonl, out_dir.clone()).unwrap();
            output.write(&mut writer).unwrap();
        }

        for table in AnalysisOutput::TABLES {
            assert!(out_dir.join(format!("{}.jsonl", table)).exists(), "missing {}", table);
        }

        let report = fs::read_to_string(out_dir.join("customer_report.jsonl")).unwrap();
        let rows: Vec<serde_json::Value> = report
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["customer_segment"], "VIP");
        assert_eq!(rows[0]["age_group"], "40-49");
        assert_eq!(rows[2]["age_group"], "Unknown");
    }

    #[test]
    fn test_sqlite_backend_writes_every_table() {
        let dir = tempdir().unwrap();
        let output = load_and_run(&dir);
        let db_path = dir.path().join("data").join("salesflow.db");

        {
            let mut writer = ReportWriter::new(BackendType::Sqlite, db_path.clone()).unwrap();
            output.write(&mut writer).unwrap();
        }

        let conn = Connection::open(&db_path).unwrap();

        for table in AnalysisOutput::TABLES {
            let exists: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(exists, 1, "missing {}", table);
        }

        let vip: i64 = conn
            .query_row(
                "SELECT total FROM customer_segments WHERE segment = 'VIP'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(vip, 1);

        let products: i64 = conn
            .query_row("SELECT COUNT(*) FROM product_report", [], |row| row.get(0))
            .unwrap();
        assert_eq!(products, 3);

        let top: String = conn
            .query_row(
                "SELECT product_name FROM top_products WHERE \"rank\" = 1",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(top, "Road-150 Red- 62");
    }
}
