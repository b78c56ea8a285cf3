use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::{
    entities::{
        customer::{self, Entity as Customer},
        product::{self, Entity as Product},
        sale::{self, Entity as Sale},
    },
    errors::ServiceError,
    services::sales::{reference_names, unwrap_txn_error, REMOVED_PRODUCT, WALK_IN_CUSTOMER},
};

/// Header of the import template; import expects the same column order.
const TEMPLATE_HEADER: [&str; 5] = ["nome", "quantidade", "preco_venda", "preco_custo", "validade"];
const TEMPLATE_EXAMPLE: [&str; 5] = ["Exemplo Camiseta", "10", "50.00", "25.00", ""];

pub const TEMPLATE_FILENAME: &str = "modelo_estoque.csv";

/// Aggregate result of a CSV import; rows never fail individually.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ImportSummary {
    pub created: u32,
    pub updated: u32,
    pub skipped: u32,
}

/// What happened to a single parsed import row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowOutcome {
    Created,
    Updated,
}

/// A structurally valid import row.
#[derive(Debug, Clone)]
struct ParsedRow {
    name: String,
    quantity: i32,
    price: f64,
    cost_price: f64,
    expiry: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Products,
    Sales,
    Customers,
}

impl ExportKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "products" => Some(Self::Products),
            "sales" => Some(Self::Sales),
            "customers" => Some(Self::Customers),
            _ => None,
        }
    }

    pub fn filename(self) -> &'static str {
        match self {
            Self::Products => "produtos.csv",
            Self::Sales => "vendas.csv",
            Self::Customers => "clientes.csv",
        }
    }
}

/// CSV template/import/export plus sales-history deletion.
#[derive(Clone)]
pub struct BulkService {
    db: Arc<DatabaseConnection>,
}

impl BulkService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// The downloadable import template: fixed header plus one example row.
    pub fn template_csv(&self) -> Result<Vec<u8>, ServiceError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(TEMPLATE_HEADER)?;
        writer.write_record(TEMPLATE_EXAMPLE)?;
        finish(writer)
    }

    /// Imports products from CSV bytes, upserting by exact product name.
    ///
    /// Row rules (after the header): fewer than three columns, a blank name,
    /// or any numeric parse failure skips the row. Price and cost accept a
    /// comma as decimal separator. A matching name adds the row's quantity
    /// to existing stock and overwrites the cost only when the new cost is
    /// positive; otherwise a new product is inserted. All row effects commit
    /// together; a malformed stream aborts the import with nothing applied.
    #[instrument(skip(self, data))]
    pub async fn import_csv(&self, data: &[u8]) -> Result<ImportSummary, ServiceError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(data);

        let mut rows = Vec::new();
        let mut skipped: u32 = 0;
        for record in reader.records() {
            let record = record.map_err(|e| {
                ServiceError::InvalidInput(format!("could not parse CSV file: {}", e))
            })?;
            match parse_row(&record) {
                Some(row) => rows.push(row),
                None => skipped += 1,
            }
        }

        let (created, updated) = self
            .db
            .transaction::<_, (u32, u32), ServiceError>(move |txn| {
                Box::pin(async move {
                    let mut created: u32 = 0;
                    let mut updated: u32 = 0;
                    for row in rows {
                        match apply_row(txn, row).await? {
                            RowOutcome::Created => created += 1,
                            RowOutcome::Updated => updated += 1,
                        }
                    }
                    Ok((created, updated))
                })
            })
            .await
            .map_err(unwrap_txn_error)?;

        let summary = ImportSummary {
            created,
            updated,
            skipped,
        };
        info!(
            created = summary.created,
            updated = summary.updated,
            skipped = summary.skipped,
            "CSV import finished"
        );
        Ok(summary)
    }

    /// Dumps every row of the requested kind as CSV.
    #[instrument(skip(self))]
    pub async fn export_csv(&self, kind: ExportKind) -> Result<Vec<u8>, ServiceError> {
        match kind {
            ExportKind::Products => self.export_products().await,
            ExportKind::Sales => self.export_sales().await,
            ExportKind::Customers => self.export_customers().await,
        }
    }

    async fn export_products(&self) -> Result<Vec<u8>, ServiceError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(["ID", "Nome", "Quantidade", "Preço Venda", "Preço Custo"])?;
        for p in Product::find()
            .order_by_asc(product::Column::Id)
            .all(&*self.db)
            .await?
        {
            writer.write_record(&[
                p.id.to_string(),
                p.name,
                p.quantity.to_string(),
                p.price.to_string(),
                p.cost_price.map(|c| c.to_string()).unwrap_or_default(),
            ])?;
        }
        finish(writer)
    }

    async fn export_sales(&self) -> Result<Vec<u8>, ServiceError> {
        let sales = Sale::find()
            .order_by_asc(sale::Column::Id)
            .all(&*self.db)
            .await?;
        let (products, customers) = reference_names(&self.db, &sales).await?;

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(["ID", "Data", "Produto", "Cliente", "Qtd", "Total"])?;
        for s in sales {
            let product_name = products
                .get(&s.product_id)
                .cloned()
                .unwrap_or_else(|| REMOVED_PRODUCT.to_string());
            let customer_name = s
                .customer_id
                .and_then(|id| customers.get(&id).cloned())
                .unwrap_or_else(|| WALK_IN_CUSTOMER.to_string());
            writer.write_record(&[
                s.id.to_string(),
                s.sold_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                product_name,
                customer_name,
                s.quantity.to_string(),
                s.total_value.to_string(),
            ])?;
        }
        finish(writer)
    }

    async fn export_customers(&self) -> Result<Vec<u8>, ServiceError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(["ID", "Nome", "Telefone", "Email", "Cidade"])?;
        for c in Customer::find()
            .order_by_asc(customer::Column::Id)
            .all(&*self.db)
            .await?
        {
            writer.write_record(&[
                c.id.to_string(),
                c.name,
                c.phone.unwrap_or_default(),
                c.email.unwrap_or_default(),
                c.city.unwrap_or_default(),
            ])?;
        }
        finish(writer)
    }

    /// Deletes the entire sales history. A single statement, so the store
    /// either removes every row or none.
    #[instrument(skip(self))]
    pub async fn clear_sales(&self) -> Result<u64, ServiceError> {
        let res = Sale::delete_many().exec(&*self.db).await?;
        info!(deleted = res.rows_affected, "Sales history cleared");
        Ok(res.rows_affected)
    }
}

async fn apply_row<C: sea_orm::ConnectionTrait>(
    txn: &C,
    row: ParsedRow,
) -> Result<RowOutcome, ServiceError> {
    match Product::find()
        .filter(product::Column::Name.eq(&row.name))
        .one(txn)
        .await?
    {
        Some(existing) => {
            let mut active: product::ActiveModel = existing.clone().into();
            active.quantity = Set(existing.quantity + row.quantity);
            // An explicit zero or blank cost never clobbers a stored cost.
            if row.cost_price > 0.0 {
                active.cost_price = Set(Some(row.cost_price));
            }
            active.update(txn).await?;
            Ok(RowOutcome::Updated)
        }
        None => {
            product::ActiveModel {
                name: Set(row.name),
                quantity: Set(row.quantity),
                price: Set(row.price),
                cost_price: Set(Some(row.cost_price)),
                expiry: Set(Some(row.expiry)),
                ..Default::default()
            }
            .insert(txn)
            .await?;
            Ok(RowOutcome::Created)
        }
    }
}

fn parse_row(record: &csv::StringRecord) -> Option<ParsedRow> {
    if record.len() < 3 {
        return None;
    }

    let name = record.get(0)?.trim();
    if name.is_empty() {
        return None;
    }

    let quantity: i32 = record.get(1)?.trim().parse().ok()?;
    let price = parse_decimal(record.get(2)?)?;
    let cost_price = match record.get(3) {
        Some(raw) if !raw.is_empty() => parse_decimal(raw)?,
        _ => 0.0,
    };
    let expiry = record
        .get(4)
        .map(|s| s.trim().to_string())
        .unwrap_or_default();

    Some(ParsedRow {
        name: name.to_string(),
        quantity,
        price,
        cost_price,
        expiry,
    })
}

/// Decimal parse accepting a comma as decimal separator.
fn parse_decimal(raw: &str) -> Option<f64> {
    raw.trim().replace(',', ".").parse().ok()
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>, ServiceError> {
    writer
        .into_inner()
        .map_err(|e| ServiceError::InternalError(format!("csv buffer flush failed: {}", e)))
}
