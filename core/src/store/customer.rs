use super::BatchStore;
use crate::{
    customer_update::{AddressUpdate, ContactUpdate, NameUpdate},
    error::BatchResult,
    statement::Customer,
    types::CustomerId,
};
use rusqlite::{params, types::Value, OptionalExtension, Row};

const CUSTOMER_COLUMNS: &str = "customer_id, first_name, middle_name, last_name,
    address1, address2, city, state, postal_code, ssn,
    email_address, home_phone, cell_phone, work_phone, notification_pref";

const UPDATE_NAME_SQL: &str = "UPDATE customer SET
    first_name  = COALESCE(?2, first_name),
    middle_name = COALESCE(?3, middle_name),
    last_name   = COALESCE(?4, last_name)
    WHERE customer_id = ?1";

const UPDATE_ADDRESS_SQL: &str = "UPDATE customer SET
    address1    = COALESCE(?2, address1),
    address2    = COALESCE(?3, address2),
    city        = COALESCE(?4, city),
    state       = COALESCE(?5, state),
    postal_code = COALESCE(?6, postal_code)
    WHERE customer_id = ?1";

const UPDATE_CONTACT_SQL: &str = "UPDATE customer SET
    email_address     = COALESCE(?2, email_address),
    home_phone        = COALESCE(?3, home_phone),
    cell_phone        = COALESCE(?4, cell_phone),
    work_phone        = COALESCE(?5, work_phone),
    notification_pref = COALESCE(?6, notification_pref)
    WHERE customer_id = ?1";

fn map_customer(row: &Row<'_>) -> rusqlite::Result<Customer> {
    Ok(Customer {
        customer_id:             row.get(0)?,
        first_name:              row.get(1)?,
        middle_name:             row.get(2)?,
        last_name:               row.get(3)?,
        address1:                row.get(4)?,
        address2:                row.get(5)?,
        city:                    row.get(6)?,
        state:                   row.get(7)?,
        postal_code:             row.get(8)?,
        ssn:                     row.get(9)?,
        email_address:           row.get(10)?,
        home_phone:              row.get(11)?,
        cell_phone:              row.get(12)?,
        work_phone:              row.get(13)?,
        notification_preference: row.get(14)?,
    })
}

impl BatchStore {
    // ── Customer ──────────────────────────────────────────────────

    /// Provisioning insert. The pipeline itself never creates customers.
    pub fn insert_customer(&self, c: &Customer) -> BatchResult<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO customer ({CUSTOMER_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
            ),
            params![
                c.customer_id,
                c.first_name,
                c.middle_name,
                c.last_name,
                c.address1,
                c.address2,
                c.city,
                c.state,
                c.postal_code,
                c.ssn,
                c.email_address,
                c.home_phone,
                c.cell_phone,
                c.work_phone,
                c.notification_preference,
            ],
        )?;
        Ok(())
    }

    pub fn customer_count(&self, customer_id: CustomerId) -> BatchResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM customer WHERE customer_id = ?1",
            params![customer_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn customer(&self, customer_id: CustomerId) -> BatchResult<Option<Customer>> {
        let customer = self
            .conn
            .query_row(
                &format!("SELECT {CUSTOMER_COLUMNS} FROM customer WHERE customer_id = ?1"),
                params![customer_id],
                map_customer,
            )
            .optional()?;
        Ok(customer)
    }

    /// Customers in id order, `limit` rows starting at `offset`.
    pub fn customers_page(&self, offset: u64, limit: usize) -> BatchResult<Vec<Customer>> {
        self.query_rows(
            &format!(
                "SELECT {CUSTOMER_COLUMNS} FROM customer
                 ORDER BY customer_id LIMIT ?1 OFFSET ?2"
            ),
            params![limit as i64, offset as i64],
            map_customer,
        )
    }

    // ── Coalescing updates ────────────────────────────────────────

    pub fn update_customer_names(&self, updates: &[&NameUpdate]) -> BatchResult<Vec<usize>> {
        let sets: Vec<Vec<Value>> = updates
            .iter()
            .map(|u| {
                vec![
                    u.customer_id.into(),
                    u.first_name.clone().into(),
                    u.middle_name.clone().into(),
                    u.last_name.clone().into(),
                ]
            })
            .collect();
        self.execute_many(UPDATE_NAME_SQL, &sets)
    }

    pub fn update_customer_addresses(&self, updates: &[&AddressUpdate]) -> BatchResult<Vec<usize>> {
        let sets: Vec<Vec<Value>> = updates
            .iter()
            .map(|u| {
                vec![
                    u.customer_id.into(),
                    u.address1.clone().into(),
                    u.address2.clone().into(),
                    u.city.clone().into(),
                    u.state.clone().into(),
                    u.postal_code.clone().into(),
                ]
            })
            .collect();
        self.execute_many(UPDATE_ADDRESS_SQL, &sets)
    }

    pub fn update_customer_contacts(&self, updates: &[&ContactUpdate]) -> BatchResult<Vec<usize>> {
        let sets: Vec<Vec<Value>> = updates
            .iter()
            .map(|u| {
                vec![
                    u.customer_id.into(),
                    u.email_address.clone().into(),
                    u.home_phone.clone().into(),
                    u.cell_phone.clone().into(),
                    u.work_phone.clone().into(),
                    u.notification_preference.into(),
                ]
            })
            .collect();
        self.execute_many(UPDATE_CONTACT_SQL, &sets)
    }
}
