quantity!(
    /// Demand charge in currency per kilowatt of peak draw.
    KilowattRate,
    f64,
    "$/kW"
);
