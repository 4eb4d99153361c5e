//! Demo records for a fresh ledger and fix-ups for data written by earlier
//! versions of the app.

use rusqlite::Connection;
use rust_decimal::Decimal;
use time::Duration;

use crate::{
    Error,
    category::{CategoryName, get_or_create_category},
    record::{NewRecord, insert_record},
    timestamp::now_utc,
};

/// Sources that were renamed after the first release, as `(old, new)`.
const LEGACY_SOURCE_NAMES: [(&str, &str); 3] = [
    ("Academia Forma Brasil", "Academia Adrena"),
    ("Lanchonete do Seu José", "Lanchonete da Cau"),
    ("Loja da Dona Maria", "Armarinho Eliana"),
];

/// Replace the old names of the demo businesses with their current names.
pub(crate) fn rename_legacy_sources(connection: &Connection) -> Result<(), Error> {
    let mut statement = connection.prepare("UPDATE record SET source = ?2 WHERE source = ?1")?;

    for (old_name, new_name) in LEGACY_SOURCE_NAMES {
        let rows_affected = statement.execute((old_name, new_name))?;

        if rows_affected > 0 {
            tracing::info!("Renamed {rows_affected} records from \"{old_name}\" to \"{new_name}\"");
        }
    }

    Ok(())
}

struct DemoRecord {
    /// Offset from midnight UTC today.
    offset: Duration,
    source: &'static str,
    category: &'static str,
    /// Amount in cents.
    cents: i64,
    notes: &'static str,
}

const fn at(days_ago: i64, hour: i64) -> Duration {
    Duration::hours(hour - days_ago * 24)
}

const DEMO_RECORDS: [DemoRecord; 11] = [
    DemoRecord {
        offset: at(10, 8),
        source: "Academia Adrena",
        category: "Mensalidade",
        cents: 11990,
        notes: "Mensalidade - João Silva",
    },
    DemoRecord {
        offset: at(9, 19),
        source: "Academia Adrena",
        category: "Serviço",
        cents: 4500,
        notes: "Personal trainer - 1h",
    },
    DemoRecord {
        offset: at(8, 7),
        source: "Academia Adrena",
        category: "Mensalidade",
        cents: 8990,
        notes: "Plano estudante - Maria",
    },
    DemoRecord {
        offset: at(7, 12),
        source: "Lanchonete da Cau",
        category: "Alimentação",
        cents: 2850,
        notes: "Marmitex grande + refrigerante",
    },
    DemoRecord {
        offset: at(6, 14),
        source: "Lanchonete da Cau",
        category: "Alimentação",
        cents: 1500,
        notes: "Sanduíche natural",
    },
    DemoRecord {
        offset: at(5, 11),
        source: "Lanchonete da Cau",
        category: "Alimentação",
        cents: 4200,
        notes: "Almoço executivo para 2",
    },
    DemoRecord {
        offset: at(4, 16),
        source: "Armarinho Eliana",
        category: "Produto",
        cents: 8500,
        notes: "Camiseta + bermuda infantil",
    },
    DemoRecord {
        offset: at(3, 10),
        source: "Armarinho Eliana",
        category: "Produto",
        cents: 12000,
        notes: "Calça jeans feminina",
    },
    DemoRecord {
        offset: at(2, 15),
        source: "Armarinho Eliana",
        category: "Produto",
        cents: 6500,
        notes: "Kit 3 camisetas masculinas",
    },
    DemoRecord {
        offset: at(1, 9),
        source: "Academia Adrena",
        category: "Serviço",
        cents: 2500,
        notes: "Aula avulsa de spinning",
    },
    DemoRecord {
        offset: at(0, -6),
        source: "Lanchonete da Cau",
        category: "Alimentação",
        cents: 3250,
        notes: "Combo hambúrguer",
    },
];

/// Insert records for three neighbourhood businesses over the last ten days.
///
/// Runs inside the caller's transaction, so it does not use
/// [crate::record::create_record].
pub(crate) fn insert_demo_records(connection: &Connection) -> Result<(), Error> {
    let today = now_utc().date().midnight();

    for demo_record in &DEMO_RECORDS {
        let category_name = CategoryName::new_unchecked(demo_record.category);
        let category = get_or_create_category(&category_name, connection)?;

        let new_record = NewRecord::build(demo_record.source, category_name)
            .timestamp(today + demo_record.offset)
            .amount(Decimal::new(demo_record.cents, 2))
            .notes(Some(demo_record.notes));

        insert_record(&new_record, category.id, connection)?;
    }

    Ok(())
}
