pub const MIN_PASSWORD_LENGTH: usize = 8;

pub mod intervals {
    use std::time::Duration;

    pub const EXPIRED_SESSION_SWEEP: Duration = Duration::from_secs(60);
}

pub mod limits {

    pub const DASHBOARD_RECENT_VISITS: u64 = 10;

    pub const DEFAULT_RECENT_VISITS: u64 = 20;

    pub const MAX_RECENT_VISITS: u64 = 500;

    pub const DEFAULT_AUDIT_PAGE_SIZE: u64 = 50;

    pub const MAX_AUDIT_PAGE_SIZE: u64 = 500;
}

pub mod report {

    pub const CSV_HEADER: [&str; 5] = ["Visitante", "Documento", "Entrada", "Salida", "Motivo"];

    pub const CSV_FILENAME: &str = "reporte_ingresos.csv";

    pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";
}
