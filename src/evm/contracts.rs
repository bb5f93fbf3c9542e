//! Contract ABI definitions
//!
//! Uses alloy's sol! macro to generate type-safe bindings. These are fixed
//! external schemas; the struct returned by `flows` must match the
//! destination account contract exactly.

#![allow(clippy::too_many_arguments)]

use alloy::sol;

sol! {
    /// Token messenger entry point on the source chain.
    #[sol(rpc)]
    contract TokenMessenger {
        /// Burn `amount` of `burnToken` toward `destinationDomain`, carrying
        /// `hookData` for the destination-chain verifier.
        function depositForBurnWithHook(
            uint256 amount,
            uint32 destinationDomain,
            bytes32 mintRecipient,
            address burnToken,
            bytes32 destinationCaller,
            uint256 maxFee,
            uint32 minFinalityThreshold,
            bytes hookData
        ) external;
    }

    /// Deterministic per-owner account on the destination chain.
    #[sol(rpc)]
    contract DestinationAccount {
        /// Per-nonce flow record. Zero struct when the nonce is unknown.
        function flows(uint256 nonce) external view returns (
            address indexer,
            address executor,
            uint256 amount,
            bytes32 messageHash,
            bool executed
        );
    }

    /// Minimal ERC-20 surface for pre-flight checks.
    #[sol(rpc)]
    contract IERC20 {
        function balanceOf(address owner) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }
}
